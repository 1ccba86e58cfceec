fn main() {
    // Provide app_main stub for ESP-IDF
    embuild::espidf::sysenv::output();

    // Network and tuning settings are read with option_env! at compile time
    for var in [
        "WIFI_SSID",
        "WIFI_PASSWORD",
        "TELEMETRY_SERVER",
        "TELEMETRY_FRAMING",
        "ANGLE_WRAP",
        "CALIB_SAMPLES",
    ] {
        println!("cargo:rerun-if-env-changed={}", var);
    }
}
