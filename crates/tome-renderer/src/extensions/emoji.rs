//! `:shortcode:` emoji and icon substitution.
//!
//! Runs on text events only, so shortcodes in inline code and code blocks are
//! never replaced.

use crate::state::escape_html;

/// Icon set prefixes (`:material-github:`, `:fontawesome-brands-php:`).
const ICON_PREFIXES: &[&str] = &["material-", "fontawesome-", "octicons-", "simple-"];

/// Emoji shortcodes, sorted by name.
static EMOJI: &[(&str, &str)] = &[
    ("+1", "👍"),
    ("-1", "👎"),
    ("100", "💯"),
    ("bangbang", "‼️"),
    ("beetle", "🐞"),
    ("bell", "🔔"),
    ("book", "📖"),
    ("books", "📚"),
    ("boom", "💥"),
    ("bug", "🐛"),
    ("bulb", "💡"),
    ("calendar", "📆"),
    ("check", "✔️"),
    ("clap", "👏"),
    ("clipboard", "📋"),
    ("coffee", "☕"),
    ("computer", "💻"),
    ("construction", "🚧"),
    ("crab", "🦀"),
    ("cry", "😢"),
    ("dart", "🎯"),
    ("elephant", "🐘"),
    ("exclamation", "❗"),
    ("eyes", "👀"),
    ("fire", "🔥"),
    ("gear", "⚙️"),
    ("globe_with_meridians", "🌐"),
    ("hammer", "🔨"),
    ("hammer_and_wrench", "🛠️"),
    ("heart", "❤️"),
    ("heavy_check_mark", "✔️"),
    ("hourglass", "⌛"),
    ("hugs", "🤗"),
    ("information_source", "ℹ️"),
    ("joy", "😂"),
    ("key", "🔑"),
    ("lady_beetle", "🐞"),
    ("laughing", "😆"),
    ("link", "🔗"),
    ("lock", "🔒"),
    ("mag", "🔍"),
    ("memo", "📝"),
    ("mortar_board", "🎓"),
    ("no_entry", "⛔"),
    ("ok_hand", "👌"),
    ("package", "📦"),
    ("pencil", "📝"),
    ("pencil2", "✏️"),
    ("penguin", "🐧"),
    ("pushpin", "📌"),
    ("question", "❓"),
    ("recycle", "♻️"),
    ("rocket", "🚀"),
    ("rotating_light", "🚨"),
    ("scroll", "📜"),
    ("see_no_evil", "🙈"),
    ("shrug", "🤷"),
    ("slightly_smiling_face", "🙂"),
    ("smile", "😄"),
    ("smiley", "😃"),
    ("snake", "🐍"),
    ("sparkles", "✨"),
    ("star", "⭐"),
    ("stop_sign", "🛑"),
    ("sweat_smile", "😅"),
    ("tada", "🎉"),
    ("thinking", "🤔"),
    ("thumbsdown", "👎"),
    ("thumbsup", "👍"),
    ("triangular_flag_on_post", "🚩"),
    ("trophy", "🏆"),
    ("unlock", "🔓"),
    ("warning", "⚠️"),
    ("wave", "👋"),
    ("whale", "🐳"),
    ("white_check_mark", "✅"),
    ("wink", "😉"),
    ("wrench", "🔧"),
    ("x", "❌"),
    ("zap", "⚡"),
];

/// Escape `text` for HTML, replacing known shortcodes.
///
/// Unknown shortcodes are left as typed.
pub(crate) fn replace_shortcodes(text: &str) -> String {
    if !text.contains(':') {
        return escape_html(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(':') {
        let after = &rest[start + 1..];
        let replacement = after
            .find(':')
            .and_then(|end| Some((end, shortcode_html(&after[..end])?)));
        if let Some((end, html)) = replacement {
            out.push_str(&escape_html(&rest[..start]));
            out.push_str(&html);
            rest = &after[end + 1..];
        } else {
            out.push_str(&escape_html(&rest[..=start]));
            rest = after;
        }
    }
    out.push_str(&escape_html(rest));
    out
}

fn shortcode_html(name: &str) -> Option<String> {
    let valid = !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '-' | '+'));
    if !valid {
        return None;
    }

    if let Ok(index) = EMOJI.binary_search_by(|(code, _)| (*code).cmp(name)) {
        let (_, emoji) = EMOJI[index];
        return Some(format!(r#"<span class="emoji" title=":{name}:">{emoji}</span>"#));
    }

    ICON_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
        .then(|| format!(r#"<span class="twemoji" data-icon="{name}" aria-hidden="true"></span>"#))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_table_sorted() {
        assert!(EMOJI.windows(2).all(|pair| pair[0].0 < pair[1].0));
    }

    #[test]
    fn test_emoji_replaced() {
        assert_eq!(
            replace_shortcodes("Ship it :rocket:!"),
            r#"Ship it <span class="emoji" title=":rocket:">🚀</span>!"#
        );
    }

    #[test]
    fn test_icon_replaced() {
        let html = replace_shortcodes(":fontawesome-brands-php: PHP");
        assert!(html.starts_with(r#"<span class="twemoji" data-icon="fontawesome-brands-php""#));
        assert!(html.ends_with("</span> PHP"));
    }

    #[test]
    fn test_unknown_and_time_untouched() {
        assert_eq!(replace_shortcodes("at 12:30:45"), "at 12:30:45");
        assert_eq!(replace_shortcodes(":not_an_emoji:"), ":not_an_emoji:");
        assert_eq!(replace_shortcodes("a: b"), "a: b");
    }

    #[test]
    fn test_text_escaped() {
        assert_eq!(
            replace_shortcodes("<b> :tada:"),
            r#"&lt;b&gt; <span class="emoji" title=":tada:">🎉</span>"#
        );
    }

    #[test]
    fn test_adjacent_shortcodes() {
        let html = replace_shortcodes(":+1::smile:");
        assert!(html.contains("👍"));
        assert!(html.contains("😄"));
    }
}
