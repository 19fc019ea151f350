//! Column names shared across the cleaning stages and the KPI engine.
//! Raw catalog records use the same names for the fields we keep.

pub const ID: &str = "id";
pub const TITLE: &str = "title";
pub const TAGLINE: &str = "tagline";
pub const OVERVIEW: &str = "overview";
pub const RELEASE_DATE: &str = "release_date";
pub const STATUS: &str = "status";
pub const GENRES: &str = "genres";
pub const BELONGS_TO_COLLECTION: &str = "belongs_to_collection";
pub const PRODUCTION_COMPANIES: &str = "production_companies";
pub const PRODUCTION_COUNTRIES: &str = "production_countries";
pub const SPOKEN_LANGUAGES: &str = "spoken_languages";
pub const ORIGIN_COUNTRY: &str = "origin_country";
pub const CREDITS: &str = "credits";
pub const BUDGET: &str = "budget";
pub const REVENUE: &str = "revenue";
pub const BUDGET_MUSD: &str = "budget_musd";
pub const REVENUE_MUSD: &str = "revenue_musd";
pub const RUNTIME: &str = "runtime";
pub const POPULARITY: &str = "popularity";
pub const VOTE_COUNT: &str = "vote_count";
pub const VOTE_AVERAGE: &str = "vote_average";
pub const CAST: &str = "cast";
pub const CAST_SIZE: &str = "cast_size";
pub const DIRECTOR: &str = "director";
pub const CREW_SIZE: &str = "crew_size";

// Derived by the KPI engine
pub const PROFIT: &str = "profit";
pub const ROI: &str = "roi";

/// Separator for multi-valued text cells ("Action|Science Fiction")
pub const DELIMITER: &str = "|";

/// Crew job title that marks a director in the credits payload
pub const DIRECTOR_JOB: &str = "Director";

/// Currency columns are reported in millions
pub const DOLLARS_PER_MILLION: f64 = 1_000_000.0;

/// Column order of the finalized movie table
pub const CANONICAL_COLUMNS: [&str; 22] = [
    "id",
    "title",
    "tagline",
    "release_date",
    "genres",
    "belongs_to_collection",
    "original_language",
    "budget_musd",
    "revenue_musd",
    "production_companies",
    "production_countries",
    "vote_count",
    "vote_average",
    "popularity",
    "runtime",
    "overview",
    "spoken_languages",
    "poster_path",
    "cast",
    "cast_size",
    "director",
    "crew_size",
];

/// Columns with no analytical value in the catalog payload
pub const DEFAULT_DROP_COLUMNS: [&str; 5] = ["adult", "imdb_id", "original_title", "video", "homepage"];

/// Text values the catalog uses in place of a real tagline or overview
pub const DEFAULT_PLACEHOLDER_TEXT: [&str; 4] = ["No Tagline", "No Overview", "No Data", ""];

/// Release status a movie must carry to be analysed
pub const RELEASED_STATUS: &str = "Released";

/// Catalog API defaults
pub const DEFAULT_TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_TMDB_LANGUAGE: &str = "en-US";
