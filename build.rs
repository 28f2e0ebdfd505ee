fn main() {
    // Only emit the ESP-IDF link/env metadata for device builds; host test
    // builds have no IDF toolchain to query.
    if std::env::var("CARGO_FEATURE_ESPIDF").is_ok() {
        embuild::espidf::sysenv::output();
    }
}
