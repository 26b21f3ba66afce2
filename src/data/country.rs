// country.rs - Country name normalization and continent lookup

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Sentinel used for every metadata field that cannot be determined.
pub const UNKNOWN: &str = "Unknown";

/// Default minimum fuzzy score (0-100) for accepting an approximate match.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 80.0;

/// Free-text country normalization. Implementations must be thread-safe;
/// headers are parsed once at load time but the normalizer is shared.
pub trait CountryNormalizer: Send + Sync {
    /// Canonical country name for a raw header token, or `None` for no match.
    fn normalize(&self, raw: &str) -> Option<String>;

    /// Continent of a canonical country name.
    fn continent(&self, country: &str) -> Option<String>;
}

struct CountryEntry {
    name: &'static str,
    alpha2: &'static str,
    alpha3: &'static str,
    continent: &'static str,
    aliases: &'static [&'static str],
}

const AF: &str = "Africa";
const AS: &str = "Asia";
const EU: &str = "Europe";
const NA: &str = "North America";
const SA: &str = "South America";
const OC: &str = "Oceania";

macro_rules! country {
    ($name:expr, $a2:expr, $a3:expr, $cont:expr) => {
        CountryEntry { name: $name, alpha2: $a2, alpha3: $a3, continent: $cont, aliases: &[] }
    };
    ($name:expr, $a2:expr, $a3:expr, $cont:expr, [$($alias:expr),*]) => {
        CountryEntry { name: $name, alpha2: $a2, alpha3: $a3, continent: $cont, aliases: &[$($alias),*] }
    };
}

static COUNTRIES: &[CountryEntry] = &[
    country!("Afghanistan", "AF", "AFG", AS),
    country!("Albania", "AL", "ALB", EU),
    country!("Algeria", "DZ", "DZA", AF),
    country!("Angola", "AO", "AGO", AF),
    country!("Argentina", "AR", "ARG", SA),
    country!("Armenia", "AM", "ARM", AS),
    country!("Australia", "AU", "AUS", OC),
    country!("Austria", "AT", "AUT", EU),
    country!("Azerbaijan", "AZ", "AZE", AS),
    country!("Bahrain", "BH", "BHR", AS),
    country!("Bangladesh", "BD", "BGD", AS),
    country!("Belarus", "BY", "BLR", EU),
    country!("Belgium", "BE", "BEL", EU),
    country!("Benin", "BJ", "BEN", AF),
    country!("Bhutan", "BT", "BTN", AS),
    country!("Bolivia, Plurinational State of", "BO", "BOL", SA, ["Bolivia"]),
    country!("Bosnia and Herzegovina", "BA", "BIH", EU, ["Bosnia"]),
    country!("Botswana", "BW", "BWA", AF),
    country!("Brazil", "BR", "BRA", SA),
    country!("Brunei Darussalam", "BN", "BRN", AS, ["Brunei"]),
    country!("Bulgaria", "BG", "BGR", EU),
    country!("Burkina Faso", "BF", "BFA", AF),
    country!("Burundi", "BI", "BDI", AF),
    country!("Cambodia", "KH", "KHM", AS),
    country!("Cameroon", "CM", "CMR", AF),
    country!("Canada", "CA", "CAN", NA),
    country!("Central African Republic", "CF", "CAF", AF),
    country!("Chad", "TD", "TCD", AF),
    country!("Chile", "CL", "CHL", SA),
    country!("China", "CN", "CHN", AS, ["PRC"]),
    country!("Colombia", "CO", "COL", SA),
    country!("Congo", "CG", "COG", AF),
    country!("Congo, The Democratic Republic of the", "CD", "COD", AF, ["DRC", "DR Congo"]),
    country!("Costa Rica", "CR", "CRI", NA),
    country!("Côte d'Ivoire", "CI", "CIV", AF, ["Ivory Coast", "Cote d'Ivoire"]),
    country!("Croatia", "HR", "HRV", EU),
    country!("Cuba", "CU", "CUB", NA),
    country!("Cyprus", "CY", "CYP", AS),
    country!("Czechia", "CZ", "CZE", EU, ["Czech Republic"]),
    country!("Denmark", "DK", "DNK", EU),
    country!("Dominican Republic", "DO", "DOM", NA),
    country!("Ecuador", "EC", "ECU", SA),
    country!("Egypt", "EG", "EGY", AF),
    country!("El Salvador", "SV", "SLV", NA),
    country!("Estonia", "EE", "EST", EU),
    country!("Ethiopia", "ET", "ETH", AF),
    country!("Fiji", "FJ", "FJI", OC),
    country!("Finland", "FI", "FIN", EU),
    country!("France", "FR", "FRA", EU),
    country!("Gabon", "GA", "GAB", AF),
    country!("Gambia", "GM", "GMB", AF),
    country!("Georgia", "GE", "GEO", AS),
    country!("Germany", "DE", "DEU", EU),
    country!("Ghana", "GH", "GHA", AF),
    country!("Greece", "GR", "GRC", EU),
    country!("Guatemala", "GT", "GTM", NA),
    country!("Guinea", "GN", "GIN", AF),
    country!("Haiti", "HT", "HTI", NA),
    country!("Honduras", "HN", "HND", NA),
    country!("Hong Kong", "HK", "HKG", AS),
    country!("Hungary", "HU", "HUN", EU),
    country!("Iceland", "IS", "ISL", EU),
    country!("India", "IN", "IND", AS),
    country!("Indonesia", "ID", "IDN", AS),
    country!("Iran, Islamic Republic of", "IR", "IRN", AS, ["Iran"]),
    country!("Iraq", "IQ", "IRQ", AS),
    country!("Ireland", "IE", "IRL", EU),
    country!("Israel", "IL", "ISR", AS),
    country!("Italy", "IT", "ITA", EU),
    country!("Jamaica", "JM", "JAM", NA),
    country!("Japan", "JP", "JPN", AS),
    country!("Jordan", "JO", "JOR", AS),
    country!("Kazakhstan", "KZ", "KAZ", AS),
    country!("Kenya", "KE", "KEN", AF),
    country!("Korea, Democratic People's Republic of", "KP", "PRK", AS, ["North Korea"]),
    country!("Korea, Republic of", "KR", "KOR", AS, ["South Korea", "Korea"]),
    country!("Kuwait", "KW", "KWT", AS),
    country!("Kyrgyzstan", "KG", "KGZ", AS),
    country!("Lao People's Democratic Republic", "LA", "LAO", AS, ["Laos"]),
    country!("Latvia", "LV", "LVA", EU),
    country!("Lebanon", "LB", "LBN", AS),
    country!("Liberia", "LR", "LBR", AF),
    country!("Libya", "LY", "LBY", AF),
    country!("Lithuania", "LT", "LTU", EU),
    country!("Luxembourg", "LU", "LUX", EU),
    country!("Madagascar", "MG", "MDG", AF),
    country!("Malawi", "MW", "MWI", AF),
    country!("Malaysia", "MY", "MYS", AS),
    country!("Mali", "ML", "MLI", AF),
    country!("Mauritania", "MR", "MRT", AF),
    country!("Mexico", "MX", "MEX", NA),
    country!("Moldova, Republic of", "MD", "MDA", EU, ["Moldova"]),
    country!("Mongolia", "MN", "MNG", AS),
    country!("Morocco", "MA", "MAR", AF),
    country!("Mozambique", "MZ", "MOZ", AF),
    country!("Myanmar", "MM", "MMR", AS, ["Burma"]),
    country!("Namibia", "NA", "NAM", AF),
    country!("Nepal", "NP", "NPL", AS),
    country!("Netherlands", "NL", "NLD", EU, ["Holland"]),
    country!("New Caledonia", "NC", "NCL", OC),
    country!("New Zealand", "NZ", "NZL", OC),
    country!("Nicaragua", "NI", "NIC", NA),
    country!("Niger", "NE", "NER", AF),
    country!("Nigeria", "NG", "NGA", AF),
    country!("Norway", "NO", "NOR", EU),
    country!("Oman", "OM", "OMN", AS),
    country!("Pakistan", "PK", "PAK", AS),
    country!("Panama", "PA", "PAN", NA),
    country!("Papua New Guinea", "PG", "PNG", OC),
    country!("Paraguay", "PY", "PRY", SA),
    country!("Peru", "PE", "PER", SA),
    country!("Philippines", "PH", "PHL", AS),
    country!("Poland", "PL", "POL", EU),
    country!("Portugal", "PT", "PRT", EU),
    country!("Qatar", "QA", "QAT", AS),
    country!("Romania", "RO", "ROU", EU),
    country!("Russian Federation", "RU", "RUS", EU, ["Russia"]),
    country!("Rwanda", "RW", "RWA", AF),
    country!("Saudi Arabia", "SA", "SAU", AS),
    country!("Senegal", "SN", "SEN", AF),
    country!("Serbia", "RS", "SRB", EU),
    country!("Sierra Leone", "SL", "SLE", AF),
    country!("Singapore", "SG", "SGP", AS),
    country!("Slovakia", "SK", "SVK", EU),
    country!("Slovenia", "SI", "SVN", EU),
    country!("Somalia", "SO", "SOM", AF),
    country!("South Africa", "ZA", "ZAF", AF),
    country!("South Sudan", "SS", "SSD", AF),
    country!("Spain", "ES", "ESP", EU),
    country!("Sri Lanka", "LK", "LKA", AS),
    country!("Sudan", "SD", "SDN", AF),
    country!("Sweden", "SE", "SWE", EU),
    country!("Switzerland", "CH", "CHE", EU),
    country!("Syrian Arab Republic", "SY", "SYR", AS, ["Syria"]),
    country!("Taiwan, Province of China", "TW", "TWN", AS, ["Taiwan"]),
    country!("Tajikistan", "TJ", "TJK", AS),
    country!("Tanzania, United Republic of", "TZ", "TZA", AF, ["Tanzania"]),
    country!("Thailand", "TH", "THA", AS),
    country!("Timor-Leste", "TL", "TLS", AS, ["East Timor"]),
    country!("Togo", "TG", "TGO", AF),
    country!("Tunisia", "TN", "TUN", AF),
    country!("Türkiye", "TR", "TUR", AS, ["Turkey", "Turkiye"]),
    country!("Turkmenistan", "TM", "TKM", AS),
    country!("Uganda", "UG", "UGA", AF),
    country!("Ukraine", "UA", "UKR", EU),
    country!("United Arab Emirates", "AE", "ARE", AS, ["UAE"]),
    country!("United Kingdom", "GB", "GBR", EU, ["UK", "Great Britain", "England", "Scotland", "Wales"]),
    country!("United States", "US", "USA", NA, ["United States of America", "America"]),
    country!("Uruguay", "UY", "URY", SA),
    country!("Uzbekistan", "UZ", "UZB", AS),
    country!("Venezuela, Bolivarian Republic of", "VE", "VEN", SA, ["Venezuela"]),
    country!("Viet Nam", "VN", "VNM", AS, ["Vietnam"]),
    country!("Yemen", "YE", "YEM", AS),
    country!("Zambia", "ZM", "ZMB", AF),
    country!("Zimbabwe", "ZW", "ZWE", AF),
];

static CAMEL_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z])([A-Z])").expect("static regex"));

/// Built-in normalizer backed by an embedded country table.
///
/// Lookup order: region aliases, exact match on name / ISO code / common
/// alias, then fuzzy match on canonical names.
pub struct CountryTable {
    exact: HashMap<String, usize>,
    region_aliases: HashMap<String, String>,
    fuzzy_threshold: f64,
}

impl CountryTable {
    pub fn new() -> Self {
        let mut exact = HashMap::new();
        for (idx, entry) in COUNTRIES.iter().enumerate() {
            exact.insert(entry.name.to_uppercase(), idx);
            exact.insert(entry.alpha2.to_string(), idx);
            exact.insert(entry.alpha3.to_string(), idx);
            for alias in entry.aliases {
                exact.insert(alias.to_uppercase(), idx);
            }
        }

        let mut table = Self {
            exact,
            region_aliases: HashMap::new(),
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
        };
        for region in ["SARAWAK", "KCH", "MIRI"] {
            table.add_region_alias(region, "Malaysia");
        }
        table
    }

    /// Map a sub-national region or site code onto a country.
    pub fn add_region_alias(&mut self, region: &str, country: &str) {
        self.region_aliases
            .insert(region.trim().to_uppercase(), country.to_string());
    }

    pub fn with_fuzzy_threshold(mut self, threshold: f64) -> Self {
        self.fuzzy_threshold = threshold;
        self
    }

    fn lookup_exact(&self, candidate: &str) -> Option<&'static CountryEntry> {
        self.exact
            .get(&candidate.to_uppercase())
            .map(|&idx| &COUNTRIES[idx])
    }

    fn lookup_fuzzy(&self, candidate: &str) -> Option<&'static CountryEntry> {
        let query = candidate.to_lowercase();
        let mut best: Option<(&'static CountryEntry, f64)> = None;
        for entry in COUNTRIES {
            let score = similarity_ratio(&query, &entry.name.to_lowercase());
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((entry, score));
            }
        }
        best.filter(|(_, score)| *score >= self.fuzzy_threshold)
            .map(|(entry, _)| entry)
    }
}

impl Default for CountryTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CountryNormalizer for CountryTable {
    fn normalize(&self, raw: &str) -> Option<String> {
        let candidate = clean_country_token(raw)?;

        if let Some(country) = self.region_aliases.get(&candidate.to_uppercase()) {
            let canonical = self.lookup_exact(country).map(|entry| entry.name.to_string());
            return Some(canonical.unwrap_or_else(|| country.clone()));
        }

        self.lookup_exact(&candidate)
            .or_else(|| self.lookup_fuzzy(&candidate))
            .map(|entry| entry.name.to_string())
    }

    fn continent(&self, country: &str) -> Option<String> {
        if country == UNKNOWN {
            return None;
        }
        self.lookup_exact(country)
            .map(|entry| entry.continent.to_string())
    }
}

/// Reduce a raw header token to a lookup candidate: keep the part before the
/// first `_` or `/`, split camel case, drop `NA`/empty placeholders.
pub fn clean_country_token(raw: &str) -> Option<String> {
    let head = raw.split('_').next().unwrap_or("");
    let head = head.split('/').next().unwrap_or("").trim();
    if head.is_empty() || head.eq_ignore_ascii_case("na") || head.eq_ignore_ascii_case(UNKNOWN) {
        return None;
    }
    Some(CAMEL_BOUNDARY.replace_all(head, "$1 $2").into_owned())
}

/// Similarity score in 0-100 based on the longest common subsequence,
/// `200 * lcs / (len_a + len_b)`.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for ca in &a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    let lcs = prev[b.len()];
    200.0 * lcs as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_lookup() {
        let table = CountryTable::new();
        assert_eq!(table.normalize("China"), Some("China".to_string()));
        assert_eq!(table.normalize("china"), Some("China".to_string()));
        assert_eq!(table.normalize("VN"), Some("Viet Nam".to_string()));
        assert_eq!(table.normalize("Vietnam"), Some("Viet Nam".to_string()));
        assert_eq!(table.normalize("USA"), Some("United States".to_string()));
    }

    #[test]
    fn test_token_cleanup() {
        let table = CountryTable::new();
        assert_eq!(table.normalize("Japan_Osaka"), Some("Japan".to_string()));
        assert_eq!(table.normalize("Thailand/Bangkok"), Some("Thailand".to_string()));
        assert_eq!(table.normalize("SaudiArabia"), Some("Saudi Arabia".to_string()));
        assert_eq!(table.normalize("NA"), None);
        assert_eq!(table.normalize(""), None);
    }

    #[test]
    fn test_region_aliases() {
        let mut table = CountryTable::new();
        assert_eq!(table.normalize("Sarawak"), Some("Malaysia".to_string()));
        assert_eq!(table.normalize("KCH"), Some("Malaysia".to_string()));

        table.add_region_alias("Guangdong", "China");
        assert_eq!(table.normalize("GUANGDONG"), Some("China".to_string()));
    }

    #[test]
    fn test_fuzzy_lookup() {
        let table = CountryTable::new();
        assert_eq!(table.normalize("Singapor"), Some("Singapore".to_string()));
        assert_eq!(table.normalize("Xyzzyqq"), None);

        let strict = CountryTable::new().with_fuzzy_threshold(99.0);
        assert_eq!(strict.normalize("Singapor"), None);
    }

    #[test]
    fn test_continent() {
        let table = CountryTable::new();
        assert_eq!(table.continent("China"), Some("Asia".to_string()));
        assert_eq!(table.continent("Brazil"), Some("South America".to_string()));
        assert_eq!(table.continent(UNKNOWN), None);
    }

    #[test]
    fn test_similarity_ratio() {
        assert_eq!(similarity_ratio("abc", "abc"), 100.0);
        assert_eq!(similarity_ratio("", ""), 100.0);
        assert_eq!(similarity_ratio("abc", "xyz"), 0.0);
        let score = similarity_ratio("singapor", "singapore");
        assert!(score > 90.0 && score < 100.0);
    }
}
