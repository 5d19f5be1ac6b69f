//! Chat responder: inbound message in, optional reply out.

use crate::clock::Clock;
use crate::command::{parse, Command, InboundMessage};
use crate::config::{CardImages, PanelwardenConfig};
use crate::protocol::models::{CheckResult, Vendor};
use crate::report::{help_text, Card, GREETING, USAGE_ERROR};
use crate::verifier::DomainChecker;
use std::sync::Arc;
use tracing::info;

/// A reply to send back to the originating channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Plain text.
    Text(String),
    /// A result card.
    Card(Card),
}

/// Dispatches parsed commands to a [`DomainChecker`] and formats replies.
pub struct Responder<C> {
    checker: C,
    clock: Arc<dyn Clock>,
    bot_name: String,
    images: CardImages,
}

impl<C: DomainChecker> Responder<C> {
    /// Create a responder.
    pub fn new(checker: C, config: &PanelwardenConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            checker,
            clock,
            bot_name: config.bot_name.clone(),
            images: config.images.clone(),
        }
    }

    /// The checker this responder dispatches to.
    pub fn checker(&self) -> &C {
        &self.checker
    }

    /// Handle one message. `None` means stay silent.
    ///
    /// Checks block until the vendor round-trips finish or time out.
    pub fn respond(&self, message: &InboundMessage<'_>) -> Option<Reply> {
        let reply = match parse(message) {
            Command::Ignore => return None,
            Command::Greet => Reply::Text(GREETING.to_string()),
            Command::Help => Reply::Text(help_text()),
            Command::Usage => Reply::Text(USAGE_ERROR.to_string()),
            Command::CheckBoth(domain) => {
                let (result, label) = self.checker.check_both(&domain);
                info!(domain = %domain, license = label, ?result, "Combined license check");
                Reply::Card(self.card(&domain, result, label))
            }
            Command::CheckWhmcs(domain) => self.single(&domain, Vendor::Whmcs),
            Command::CheckBlesta(domain) => self.single(&domain, Vendor::Blesta),
        };
        Some(reply)
    }

    fn single(&self, domain: &str, vendor: Vendor) -> Reply {
        let result = self.checker.check(domain, vendor);
        info!(domain, %vendor, ?result, "License check");
        Reply::Card(self.card(domain, result, vendor.label()))
    }

    fn card(&self, domain: &str, result: CheckResult, label: &str) -> Card {
        Card::for_result(
            domain,
            result,
            label,
            &self.bot_name,
            &self.images,
            self.clock.now_utc(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use std::sync::Mutex;

    struct StubChecker {
        whmcs: CheckResult,
        blesta: CheckResult,
        calls: Mutex<Vec<(String, Vendor)>>,
    }

    impl DomainChecker for StubChecker {
        fn check(&self, domain: &str, vendor: Vendor) -> CheckResult {
            self.calls.lock().unwrap().push((domain.to_string(), vendor));
            match vendor {
                Vendor::Whmcs => self.whmcs,
                Vendor::Blesta => self.blesta,
            }
        }
    }

    fn responder(whmcs: CheckResult, blesta: CheckResult) -> Responder<StubChecker> {
        let mut config = PanelwardenConfig::new("ops@example.net", "hunter2");
        config.bot_name = "LicenseBot".to_string();
        let checker = StubChecker {
            whmcs,
            blesta,
            calls: Mutex::new(Vec::new()),
        };
        let clock = Arc::new(MockClock::from_rfc3339("2023-08-05T21:07:00Z").unwrap());
        Responder::new(checker, &config, clock)
    }

    fn card(reply: Option<Reply>) -> Card {
        match reply {
            Some(Reply::Card(card)) => card,
            other => panic!("expected card, got {:?}", other),
        }
    }

    #[test]
    fn test_ignores_chatter() {
        let r = responder(CheckResult::Valid, CheckResult::Valid);
        assert_eq!(r.respond(&InboundMessage::text("good morning")), None);
        assert!(r.checker().calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_text_replies() {
        let r = responder(CheckResult::Valid, CheckResult::Valid);
        assert_eq!(
            r.respond(&InboundMessage::text("!license")),
            Some(Reply::Text(USAGE_ERROR.to_string()))
        );
        assert_eq!(
            r.respond(&InboundMessage::text("!whmcs help")),
            Some(Reply::Text(help_text()))
        );

        let mention = InboundMessage {
            content: "hey",
            mentions_bot: true,
            ..InboundMessage::default()
        };
        assert_eq!(r.respond(&mention), Some(Reply::Text(GREETING.to_string())));
    }

    #[test]
    fn test_license_command_normalizes_and_checks_both() {
        let r = responder(CheckResult::Invalid, CheckResult::Valid);
        let card = card(r.respond(&InboundMessage::text("!license https://www.host.net/clients")));

        assert_eq!(card.field("Domain"), Some("host.net"));
        assert_eq!(card.field("Status"), Some("Verified"));
        assert_eq!(card.field("License"), Some("Blesta"));
        assert_eq!(card.footer.text, "Verified by LicenseBot at 2023-08-05 21:07 UTC");
        assert_eq!(
            *r.checker().calls.lock().unwrap(),
            vec![
                ("host.net".to_string(), Vendor::Whmcs),
                ("host.net".to_string(), Vendor::Blesta),
            ]
        );
    }

    #[test]
    fn test_combined_label_when_neither_valid() {
        let r = responder(CheckResult::Error, CheckResult::Invalid);
        let card = card(r.respond(&InboundMessage::text("!licence host.net")));
        assert_eq!(card.field("Status"), Some("Error"));
        assert_eq!(card.field("License"), Some("WHMCS / Blesta"));
        assert!(card.description.is_some());
    }

    #[test]
    fn test_single_vendor_commands() {
        let r = responder(CheckResult::Valid, CheckResult::Invalid);

        let whmcs = card(r.respond(&InboundMessage::text("!whmcs host.net")));
        assert_eq!(whmcs.field("License"), Some("WHMCS"));
        assert_eq!(whmcs.field("Status"), Some("Verified"));

        let blesta = card(r.respond(&InboundMessage::text("!blesta host.net")));
        assert_eq!(blesta.field("License"), Some("Blesta"));
        assert_eq!(blesta.field("Status"), Some("Invalid"));

        assert_eq!(r.checker().calls.lock().unwrap().len(), 2);
    }
}
