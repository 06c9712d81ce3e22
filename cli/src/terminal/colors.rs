use colored::Color;

pub const PRIMARY: Color = Color::BrightGreen;
pub const ACCENT: Color = Color::Yellow;
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::White;

pub const IPV4_ADDR: Color = Color::BrightBlue;
pub const IPV4_PREFIX: Color = Color::Blue;
pub const OS_GUESS: Color = Color::Magenta;
pub const TIMESTAMP: Color = Color::Cyan;

pub const HOST_UP: Color = Color::Green;
pub const HOST_DOWN: Color = Color::Red;
pub const HOST_UNKNOWN: Color = Color::BrightBlack;

pub const PORT_OPEN: Color = Color::Green;
pub const PORT_CLOSED: Color = Color::Red;
pub const PORT_FILTERED: Color = Color::Yellow;
