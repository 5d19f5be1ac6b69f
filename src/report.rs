//! User-facing replies: result cards and fixed texts.
//!
//! A [`Card`] serializes to the embed shape chat platforms accept
//! (`title`, `description`, `fields`, `thumbnail`, `footer`) and also renders
//! as plain text for console output.

use crate::config::CardImages;
use crate::protocol::models::CheckResult;
use crate::PanelwardenError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shown with every `Error` card.
pub const ERROR_GUIDANCE: &str = "An error has occurred. Please note that the domain given as an \
argument must not include the preceding scheme (http:// or https://) nor a subdomain of 'www.' \
(i.e. to check the license status of http://www.host.net, run `!license host.net`)";

/// Reply to a direct mention.
pub const GREETING: &str =
    "Hello! I can check domains for valid WHMCS or Blesta licenses, enter `!license help` for usage.";

/// Reply to a command with the wrong number of arguments.
pub const USAGE_ERROR: &str = "Invalid number of arguments, enter `!license help` for usage.";

/// Help text listing every command.
pub fn help_text() -> String {
    format!(
        "Host Billing License Verification Bot v{}\n\n\
         Usage:\n\t!command [domain]\n\t!command help\n\n\
         Commands:\n\
         \t`!license` - checks WHMCS and Blesta license validity\n\
         \t`!licence` - (same as above)\n\
         \t`!whmcs` - checks WHMCS license validity\n\
         \t`!blesta` - checks Blesta license validity",
        env!("CARGO_PKG_VERSION")
    )
}

/// One named card field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardField {
    /// Field label.
    pub name: String,
    /// Field value.
    pub value: String,
    /// Whether the platform may lay this field out side by side with others.
    pub inline: bool,
}

/// Card thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    /// Image URL.
    pub url: String,
}

/// Card footer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footer {
    /// Footer text.
    pub text: String,
}

/// A license check result card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Card title.
    pub title: String,
    /// Extra explanation, only set on errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Domain, Status and License fields, in that order.
    pub fields: Vec<CardField>,
    /// Status image.
    pub thumbnail: Thumbnail,
    /// Who verified and when.
    pub footer: Footer,
}

impl Card {
    /// Build the card for a finished check.
    pub fn for_result(
        domain: &str,
        result: CheckResult,
        license_label: &str,
        bot_name: &str,
        images: &CardImages,
        now: DateTime<Utc>,
    ) -> Self {
        let image = match result {
            CheckResult::Valid => &images.valid,
            CheckResult::Invalid => &images.invalid,
            CheckResult::Error => &images.error,
        };
        let description = (result == CheckResult::Error).then(|| ERROR_GUIDANCE.to_string());

        Self {
            title: format!("License Verification Summary for {}", domain),
            description,
            fields: vec![
                field("Domain", domain),
                field("Status", result.status_text()),
                field("License", license_label),
            ],
            thumbnail: Thumbnail { url: image.clone() },
            footer: Footer {
                text: format!(
                    "Verified by {} at {} UTC",
                    bot_name,
                    now.format("%Y-%m-%d %H:%M")
                ),
            },
        }
    }

    /// Value of a field by name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    /// Serialize to embed JSON.
    pub fn to_json(&self) -> Result<String, PanelwardenError> {
        serde_json::to_string(self)
            .map_err(|e| PanelwardenError::Serialization(format!("Failed to serialize card: {}", e)))
    }

    /// Render as plain text.
    pub fn render_text(&self) -> String {
        let mut out = format!("== {} ==\n", self.title);
        if let Some(description) = &self.description {
            out.push_str(description);
            out.push('\n');
        }
        for f in &self.fields {
            out.push_str(&format!("{}: {}\n", f.name, f.value));
        }
        out.push_str(&self.footer.text);
        out
    }
}

fn field(name: &str, value: &str) -> CardField {
    CardField {
        name: name.to_string(),
        value: value.to_string(),
        inline: false,
    }
}
