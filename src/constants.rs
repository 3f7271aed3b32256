/// Field name and default constants shared across the pipeline, storage and server.
/// Alias lists are ordered by priority: the first qualifying candidate wins.

// Canonical field names (as they appear in stored documents)
pub const BRAND_NAME: &str = "brandName";
pub const YEAR_FOUNDED: &str = "yearFounded";
pub const HEADQUARTERS: &str = "headquarters";
pub const NUMBER_OF_LOCATIONS: &str = "numberOfLocations";

// Record metadata owned by the storage layer, copied through untouched
pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";

// Alias candidates, highest priority first. Dotted entries address nested fields.
pub const BRAND_NAME_ALIASES: &[&str] = &["brandName", "brand.name"];
pub const YEAR_FOUNDED_ALIASES: &[&str] = &["yearFounded", "yearCreated", "yearsFounded"];
pub const HEADQUARTERS_ALIASES: &[&str] = &["headquarters", "hqAddress"];
pub const NUMBER_OF_LOCATIONS_ALIASES: &[&str] = &["numberOfLocations"];

/// Earliest accepted founding year.
pub const MIN_YEAR_FOUNDED: i64 = 1600;

/// Fallback when no `yearFounded` alias both converts and lies in range.
pub const DEFAULT_YEAR_FOUNDED: i32 = 1600;

/// Fallback and lower bound for `numberOfLocations`.
pub const DEFAULT_NUMBER_OF_LOCATIONS: i64 = 1;

/// Text substituted for an unresolved brand name or headquarters under the sentinel policy.
pub const DEFAULT_SENTINEL: &str = "unknown";

pub const DEFAULT_CONFIG_PATH: &str = "brandnorm.toml";
pub const DEFAULT_STORE_PATH: &str = "data/brands.json";
pub const DEFAULT_PORT: u16 = 3000;
