//! Choices offered by the editor's typography and canvas pickers.

pub const SANS_FONTS: &[&str] = &[
    "Auto",
    "Inter",
    "Montserrat",
    "Roboto",
    "Open Sans",
    "Lato",
    "Poppins",
    "Raleway",
    "Nunito",
    "Work Sans",
    "Source Sans 3",
];

pub const HEADLINE_SIZES: &[&str] = &["Auto", "80px", "100px", "120px", "140px", "160px", "200px"];

pub const SUBHEADLINE_SIZES: &[&str] = &["Auto", "24px", "32px", "42px", "48px", "56px", "64px"];

pub const CTA_SIZES: &[&str] = &["Auto", "24px", "32px", "40px", "48px"];

pub const LINE_HEIGHTS: &[&str] = &[
    "Auto", "0.9", "1.0", "1.1", "1.2", "1.3", "1.4", "1.5", "1.6", "1.8",
];

pub fn is_known_font(family: &str) -> bool {
    SANS_FONTS.iter().any(|f| f.eq_ignore_ascii_case(family))
}
