// Firestore REST
pub const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com";
pub const DEFAULT_DATABASE_ID: &str = "(default)";

// Emulator
pub const EMULATOR_HOST_ENV: &str = "FIRESTORE_EMULATOR_HOST";
pub const EMULATOR_TOKEN: &str = "owner";

// Metadata server
pub const METADATA_BASE_URL: &str = "http://metadata.google.internal";
pub const METADATA_TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";
pub const HEADER_METADATA_FLAVOR: &str = "Metadata-Flavor";
pub const VALUE_METADATA_FLAVOR: &str = "Google";

// Refresh this many seconds before a token expires.
pub const TOKEN_REFRESH_MARGIN_SECS: u64 = 300;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
