//! Version banner

/// Name shown in banners and usage
pub const TOOL_NAME: &str = "Myrmex";

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compilation date recorded by the build script
pub fn compiled_on() -> &'static str {
    option_env!("MYRMEX_BUILD_DATE").unwrap_or("an unknown date")
}

/// "Myrmex version X compiled on D"
pub fn banner() -> String {
    format!("{} version {} compiled on {}", TOOL_NAME, VERSION, compiled_on())
}
