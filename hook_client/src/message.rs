use serde::Serialize;
use time::OffsetDateTime;

/// A color for Discord embeds, as an RGB hex value.
///
/// The zero value means no color and is omitted from the payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Color(pub u32);

impl Color {
    pub const NONE: Color = Color(0);
    pub const AQUA: Color = Color(0x1ABC9C);
    pub const BLACK: Color = Color(0x23272A);
    pub const BLUE: Color = Color(0x3498DB);
    pub const BLURPLE: Color = Color(0x5865F2);
    pub const DARK_AQUA: Color = Color(0x11806A);
    pub const DARK_BLUE: Color = Color(0x206694);
    pub const DARK_BUT_NOT_BLACK: Color = Color(0x2C2F33);
    pub const DARKER_GREY: Color = Color(0x7F8C8D);
    pub const DARK_GOLD: Color = Color(0xC27C0E);
    pub const DARK_GREEN: Color = Color(0x1F8B4C);
    pub const DARK_GREY: Color = Color(0x979C9F);
    pub const DARK_NAVY: Color = Color(0x2C3E50);
    pub const DARK_ORANGE: Color = Color(0xA84300);
    pub const DARK_PURPLE: Color = Color(0x71368A);
    pub const DARK_RED: Color = Color(0x992D22);
    pub const DARK_VIVID_PINK: Color = Color(0xAD1457);
    pub const FUCHSIA: Color = Color(0xEB459E);
    pub const GOLD: Color = Color(0xF1C40F);
    pub const GREEN: Color = Color(0x57F287);
    pub const GREY: Color = Color(0x95A5A6);
    pub const GREYPLE: Color = Color(0x99AAB5);
    pub const LIGHT_GREY: Color = Color(0xBCC0C0);
    pub const LUMINOUS_VIVID_PINK: Color = Color(0xE91E63);
    pub const NAVY: Color = Color(0x34495E);
    pub const NOT_QUITE_BLACK: Color = Color(0x23272A);
    pub const ORANGE: Color = Color(0xE67E22);
    pub const PURPLE: Color = Color(0x9B59B6);
    pub const RED: Color = Color(0xED4245);
    pub const WHITE: Color = Color(0xFFFFFF);
    pub const YELLOW: Color = Color(0xFEE75C);

    fn is_none(&self) -> bool {
        self.0 == 0
    }
}

/// A message that can be sent to a Discord webhook.
///
/// A message needs content or at least one embed; anything else is
/// optional. Fields left at their defaults are omitted from the payload.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Message {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub allowed_mentions: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub avatar_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub username: String,
}

impl Message {
    /// Whether the message has nothing to send.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty() && self.embeds.is_empty()
    }
}

/// A Discord embed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    #[serde(skip_serializing_if = "Color::is_none")]
    pub color: Color,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<EmbedProvider>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedThumbnail>,
    #[serde(skip_serializing_if = "Option::is_none", with = "time::serde::rfc3339::option")]
    pub timestamp: Option<OffsetDateTime>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EmbedAuthor {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub icon_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EmbedField {
    pub inline: bool,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EmbedFooter {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub icon_url: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EmbedProvider {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub icon_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EmbedImage {
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EmbedThumbnail {
    pub url: String,
}
