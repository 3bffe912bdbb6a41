use teloxide::types::{KeyboardButton, KeyboardMarkup};

pub const BTN_SEND: &str = "🎥 Send video/photo";
pub const BTN_STATS: &str = "📊 Statistics";
pub const BTN_EXPORT: &str = "📥 Export Excel";
pub const BTN_LEAVE: &str = "🚪 Leave chats";
pub const BTN_YES: &str = "✅ Yes";
pub const BTN_NO: &str = "❌ No";

pub fn main_menu() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![KeyboardButton::new(BTN_SEND), KeyboardButton::new(BTN_STATS)],
        vec![KeyboardButton::new(BTN_EXPORT), KeyboardButton::new(BTN_LEAVE)],
    ])
    .resize_keyboard()
}

pub fn confirm_menu() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new(BTN_YES),
        KeyboardButton::new(BTN_NO),
    ]])
    .resize_keyboard()
}
