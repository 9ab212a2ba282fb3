use std::sync::OnceLock;

use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "assets"]
struct EmbeddedAssets;

static MAIN_CSS: OnceLock<String> = OnceLock::new();

/// Contents of `assets/main.css`, embedded at build time.
pub fn main_css() -> &'static str {
    MAIN_CSS.get_or_init(|| load_text("main.css")).as_str()
}

fn load_text(name: &str) -> String {
    let file = EmbeddedAssets::get(name)
        .unwrap_or_else(|| panic!("Failed to locate embedded asset: {name}"));
    String::from_utf8(file.data.into_owned())
        .unwrap_or_else(|_| panic!("Embedded asset {name} is not valid UTF-8"))
}
