//! US state names and postal abbreviations.

/// Full state names paired with postal abbreviations, including DC.
pub const STATES: [(&str, &str); 51] = [
    ("Alabama", "AL"),
    ("Alaska", "AK"),
    ("Arizona", "AZ"),
    ("Arkansas", "AR"),
    ("California", "CA"),
    ("Colorado", "CO"),
    ("Connecticut", "CT"),
    ("Delaware", "DE"),
    ("District of Columbia", "DC"),
    ("Florida", "FL"),
    ("Georgia", "GA"),
    ("Hawaii", "HI"),
    ("Idaho", "ID"),
    ("Illinois", "IL"),
    ("Indiana", "IN"),
    ("Iowa", "IA"),
    ("Kansas", "KS"),
    ("Kentucky", "KY"),
    ("Louisiana", "LA"),
    ("Maine", "ME"),
    ("Maryland", "MD"),
    ("Massachusetts", "MA"),
    ("Michigan", "MI"),
    ("Minnesota", "MN"),
    ("Mississippi", "MS"),
    ("Missouri", "MO"),
    ("Montana", "MT"),
    ("Nebraska", "NE"),
    ("Nevada", "NV"),
    ("New Hampshire", "NH"),
    ("New Jersey", "NJ"),
    ("New Mexico", "NM"),
    ("New York", "NY"),
    ("North Carolina", "NC"),
    ("North Dakota", "ND"),
    ("Ohio", "OH"),
    ("Oklahoma", "OK"),
    ("Oregon", "OR"),
    ("Pennsylvania", "PA"),
    ("Rhode Island", "RI"),
    ("South Carolina", "SC"),
    ("South Dakota", "SD"),
    ("Tennessee", "TN"),
    ("Texas", "TX"),
    ("Utah", "UT"),
    ("Vermont", "VT"),
    ("Virginia", "VA"),
    ("Washington", "WA"),
    ("West Virginia", "WV"),
    ("Wisconsin", "WI"),
    ("Wyoming", "WY"),
];

/// Look up the postal abbreviation for a state name, ignoring case and
/// surrounding whitespace.
///
/// # Examples
/// ```
/// use orphan_wells_core::state::abbreviation_for;
///
/// assert_eq!(abbreviation_for(" new mexico"), Some("NM"));
/// assert_eq!(abbreviation_for("Ontario"), None);
/// ```
pub fn abbreviation_for(name: &str) -> Option<&'static str> {
    let trimmed = name.trim();
    STATES
        .iter()
        .find(|(state, _)| state.eq_ignore_ascii_case(trimmed))
        .map(|(_, abbrev)| *abbrev)
}

/// Look up the state name for a postal abbreviation.
pub fn name_for(abbrev: &str) -> Option<&'static str> {
    let trimmed = abbrev.trim();
    STATES
        .iter()
        .find(|(_, code)| code.eq_ignore_ascii_case(trimmed))
        .map(|(state, _)| *state)
}
