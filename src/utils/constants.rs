//! Shared configuration constants for the crawler
//!
//! Default values, page selectors and markers used throughout the codebase
//! to ensure consistency and avoid magic numbers.

/// Catalog page listing every city with communities
pub const DEFAULT_CATALOG_URL: &str = "https://www2.avaloncommunities.com/apartment-locations";

/// Default number of city scrapes allowed to hold a browsing session at once
///
/// Sessions are the contended resource (browser memory and connection slots
/// on the remote site), so this stays small.
pub const DEFAULT_MAX_CONCURRENT_CITIES: usize = 5;

/// Attempts for discovery stages and city scrapes
pub const DEFAULT_DISCOVERY_ATTEMPTS: u8 = 3;

/// Attempts for a single community scrape
pub const DEFAULT_COMMUNITY_ATTEMPTS: u8 = 2;

/// Pause between retry attempts of one stage
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 1_000;

/// Pause after each city task before its permit is returned
pub const DEFAULT_CITY_COOLDOWN_MS: u64 = 2_000;

/// Page navigation timeout
pub const DEFAULT_PAGE_LOAD_TIMEOUT_SECS: u64 = 60;

/// Timeout for catalog and image HTTP fetches
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;

/// Viewport used for every browsing session
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1368;
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 757;

/// A stage whose failed/total ratio exceeds this marks the run degraded
pub const DEFAULT_DEGRADED_THRESHOLD: f64 = 0.2;

/// Markers surrounding the JSON payload embedded in community pages
pub const EMBEDDED_DATA_START: &str = "Fusion.globalContent=";
pub const EMBEDDED_DATA_END: &str = ";Fusion.globalContentConfig";

/// Output file names
pub const COMMUNITIES_CSV: &str = "communities.csv";
pub const APARTMENTS_CSV: &str = "apartments.csv";
pub const COMMUNITY_DOCS_DIR: &str = "communities";
pub const IMAGES_DIR: &str = "images";

/// Header of the communities table; `community_url` is the dedup key
pub const COMMUNITY_CSV_HEADERS: [&str; 11] = [
    "community_id",
    "name",
    "community_url",
    "street_number",
    "street_name",
    "city",
    "state",
    "zip_code",
    "phone",
    "office_hours",
    "scraped_at",
];

/// Header of the apartments table; `unit_url` is the dedup key
pub const APARTMENT_CSV_HEADERS: [&str; 16] = [
    "unit_url",
    "community_url",
    "unit_id",
    "bedrooms",
    "bathrooms",
    "sqft",
    "rent",
    "furnished_rent",
    "available_date",
    "floor_plan_name",
    "specials",
    "unit_details",
    "image_url",
    "image_filename",
    "virtual_tour",
    "detail_url",
];

// Page selectors (CSS, evaluated by the browser or by `scraper`)

pub const CATALOG_CITY_LINK_SELECTOR: &str = "div.col-sm > a";
pub const COMMUNITY_TOGGLE_SELECTOR: &str = "button#community-toggle";
pub const APARTMENT_TOGGLE_SELECTOR: &str = "button#apartment-toggle";
pub const COMMUNITY_CARD_SELECTOR: &str = "div[class*=\"community-card-wrapper\"]";
pub const COMMUNITY_CARD_LINK_SELECTOR: &str = "a.community-card-link";
pub const COMMUNITY_CARD_ADDRESS_SELECTOR: &str = "div[class*=\"community-card-name\"] + div";
pub const NOT_FOUND_HEADING_SELECTOR: &str = "h1";
pub const NOT_FOUND_HEADING_TEXT: &str = "404 Page Not Found";

pub const UNIT_CARD_SELECTOR: &str = "div.ant-card-body";
pub const UNIT_TITLE_SELECTOR: &str = ".title";
pub const UNIT_PRICE_SELECTOR: &str = ".price";
pub const UNIT_FURNISHED_PRICE_SELECTOR: &str = ".furnished-price";
pub const UNIT_IMAGE_SELECTOR: &str = "img";
pub const UNIT_LINK_SELECTOR: &str = "a[href]";
pub const UNIT_VIRTUAL_TOUR_SELECTOR: &str = "a.virtual-tour";

pub const PROFILE_NAME_SELECTOR: &str = "h1";
pub const PROFILE_ADDRESS_SELECTOR: &str = ".community-address";
pub const PROFILE_PHONE_SELECTOR: &str = "a[href^=\"tel:\"]";
pub const PROFILE_OFFICE_HOURS_SELECTOR: &str = ".office-hours";

/// Chrome user agent string
///
/// Chrome releases new stable versions ~every 4 weeks.
/// Update quarterly to stay within reasonable version window.
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";
