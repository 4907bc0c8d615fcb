//! Reference data the maintenance tasks check definitions against.

/// Keys a `definition.toml` may contain.
pub const VALID_KEYS: &[&str] = &[
    // Read by the boundary importer.
    "name",
    "singular",
    "domain",
    "last_updated",
    "slug_func",
    "name_func",
    "id_func",
    "is_valid_func",
    "authority",
    "source_url",
    "licence_url",
    "data_url",
    "metadata",
    "extra",
    "notes",
    "encoding",
    // Read by the shapefile pipeline. Not validated.
    "ogr2ogr",
    "prj",
    "skip_crc32",
];

/// Keys an `extra` table may contain.
pub const VALID_EXTRA_KEYS: &[&str] = &["division_id"];

pub const VALID_ENCODINGS: &[&str] = &["iso-8859-1"];

/// Province- and country-level domains. Municipal domains instead end in a
/// province abbreviation, see [`is_valid_domain`].
pub const VALID_DOMAINS: &[&str] = &[
    "Canada",
    "Alberta",
    "British Columbia",
    "Manitoba",
    "New Brunswick",
    "Newfoundland and Labrador",
    "Northwest Territories",
    "Nova Scotia",
    "Nunavut",
    "Ontario",
    "Prince Edward Island",
    "Québec",
    "Saskatchewan",
    "Yukon",
];

pub const PROVINCE_ABBREVIATIONS: &[&str] = &[
    "AB", "BC", "MB", "NB", "NL", "NS", "NT", "NU", "ON", "PE", "QC", "SK", "YT",
];

/// Definitions (by name) that have no geographic code of their own.
pub const NO_GEOGRAPHIC_CODE: &[&str] = &[
    // Montreal boroughs
    "Ahuntsic-Cartierville districts",
    "Anjou districts",
    "Côte-des-Neiges—Notre-Dame-de-Grâce districts",
    "L'Île-Bizard—Sainte-Geneviève districts",
    "Lachine districts",
    "LaSalle districts",
    "Le Plateau-Mont-Royal districts",
    "Le Sud-Ouest districts",
    "Mercier—Hochelaga-Maisonneuve districts",
    "Montréal-Nord districts",
    "Outremont districts",
    "Pierrefonds-Roxboro districts",
    "Rivière-des-Prairies—Pointe-aux-Trembles districts",
    "Rosemont—La Petite-Patrie districts",
    "Saint-Laurent districts",
    "Saint-Léonard districts",
    "Verdun districts",
    "Ville-Marie districts",
    "Villeray—Saint-Michel—Parc-Extension districts",
    // Census boundaries
    "Census divisions",
    "Census subdivisions",
];

/// Authorities that publish one dataset covering several definitions, so
/// those definitions may share a `data_url`.
pub const SHARED_AUTHORITIES: &[&str] = &[
    "Elections Prince Edward Island",
    "Regional Municipality of Peel",
    "Regional Municipality of Waterloo",
    "Ville de Montréal",
];

/// Census subdivisions known to have no ward boundaries, so the tracking
/// spreadsheet marks them "N" rather than leaving them blank.
pub const MUNICIPAL_SUBDIVISIONS_WITHOUT_WARDS: &[&str] = &[
    // NL
    "1001542",
    "1005018",
    // ON
    "3501012",
    "3518013",
    "3519046",
    "3526043",
    "3531011",
    "3532042",
    "3534021",
    "3538030",
    "3548044",
    // MB
    "4602044",
    "4609029",
    "4622026",
    // SK
    "4701024",
    "4707039",
    "4708004",
    "4709012",
    "4716029",
    // YT
    "6001009",
    // NT
    "6106023",
];

/// Columns recording the request and receipt of a boundary.
pub const REQUEST_AND_RECEIPT_HEADERS: &[&str] = &[
    "Contact",
    "Request notes",
    "Received via",
    "Last boundary",
    "Next boundary",
    "Permission to distribute",
    "Response notes",
];

/// Leading columns of the national tracking spreadsheet.
pub const SPREADSHEET_HEADERS: &[&str] = &[
    "OCD",
    "Geographic name",
    "Province or territory",
    "Population",
    "URL",
    "Shapefile?",
];

/// Data URLs the pipeline never updates automatically.
pub const NO_UPDATE: &[&str] = &[
    // Needs to be split into one shapefile per municipality.
    "http://depot.ville.montreal.qc.ca/elections-2009-districts/multi-poly/data.zip",
];

pub const DEFAULT_SPREADSHEET_URL: &str = "https://docs.google.com/spreadsheet/pub?key=0AtzgYYy0ZABtdGpJdVBrbWtUaEV0THNUd2JIZ1JqM2c&single=true&gid=18&output=csv";

pub const DEFAULT_ABBREVIATIONS_URL: &str = "https://raw.githubusercontent.com/opencivicdata/ocd-division-ids/master/mappings/country-ca-abbr/ca_provinces_and_territories.csv";

pub const DEFAULT_CENSUS_URL: &str = "http://www12.statcan.gc.ca/census-recensement/2011/dp-pd/hlt-fst/pd-pl/FullFile.cfm?T=301&LANG=Eng&OFT=CSV&OFN=98-310-XWE2011002-301.CSV";

pub const DEFAULT_REPRESENT_URL: &str = "https://represent.opennorth.ca";

pub fn is_valid_domain(domain: &str) -> bool {
    if VALID_DOMAINS.contains(&domain) {
        return true;
    }
    domain
        .rsplit_once(", ")
        .is_some_and(|(place, abbr)| !place.is_empty() && PROVINCE_ABBREVIATIONS.contains(&abbr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domains() {
        assert!(is_valid_domain("Ontario"));
        assert!(is_valid_domain("Québec"));
        assert!(is_valid_domain("Wellesley, ON"));
        assert!(is_valid_domain("Saint-Jean-sur-Richelieu, QC"));
        assert!(!is_valid_domain("Wellesley, Ontario"));
        assert!(!is_valid_domain("Wellesley, ZZ"));
        assert!(!is_valid_domain(", ON"));
        assert!(!is_valid_domain("Quebec"));
    }
}
