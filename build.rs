fn main() {
    // The version banner reports when the binary was compiled. Reproducible
    // builds pin the date through SOURCE_DATE_EPOCH.
    let compiled_on = std::env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|secs| secs.trim().parse::<i64>().ok())
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(chrono::Utc::now);

    println!(
        "cargo:rustc-env=MYRMEX_BUILD_DATE={}",
        compiled_on.format("%B %-d %Y")
    );
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
}
