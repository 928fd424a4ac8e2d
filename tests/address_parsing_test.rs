//! Property tests for the address parser

use avalon_crawler::address::parse_address;
use avalon_crawler::crawl_engine::CrawlError;
use proptest::prelude::*;

proptest! {
    #[test]
    fn well_formed_addresses_round_trip(
        number in "[1-9][0-9]{0,4}",
        street in "[A-Z][a-z]{1,8}( [A-Z][a-z]{1,8}){0,2}\\.?",
        city in "[A-Z][a-z]{1,8}( [A-Z][a-z]{1,8})?",
        state in "[A-Z]{2}",
        zip in "[0-9]{5}",
    ) {
        let raw = format!("{number} {street} • {city}, {state} {zip}");
        let address = parse_address(&raw).expect("well-formed address");
        prop_assert_eq!(address.number, number);
        prop_assert_eq!(address.street, street);
        prop_assert_eq!(address.city, city);
        prop_assert_eq!(address.state, state);
        prop_assert_eq!(address.zip, zip);
    }

    #[test]
    fn text_without_delimiter_is_malformed(raw in "[^•]{0,60}") {
        let err = parse_address(&raw).expect_err("no delimiter");
        prop_assert!(matches!(err, CrawlError::MalformedAddress(_)));
    }
}

#[test]
fn reference_addresses() {
    let address = parse_address("1099 Admiral Ct. • San Bruno, CA 94066").expect("parse");
    assert_eq!(
        (
            address.number.as_str(),
            address.street.as_str(),
            address.city.as_str(),
            address.state.as_str(),
            address.zip.as_str()
        ),
        ("1099", "Admiral Ct.", "San Bruno", "CA", "94066")
    );

    let one = parse_address("One Main St • X, CA 00000").expect("parse");
    assert_eq!(one.number, "1");
}
