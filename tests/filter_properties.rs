use proptest::prelude::*;
use roomcast::filter::Filter;

fn ascii_word() -> impl Strategy<Value = String> {
    "[a-zA-Z]{1,6}"
}

fn ascii_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 *!~._-]{0,64}"
}

fn naive_contains(dict: &[String], input: &str) -> bool {
    let cleaned: String = input
        .to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    dict.iter().any(|w| {
        let w_cleaned: String = w.to_ascii_lowercase().chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        !w_cleaned.is_empty() && cleaned.contains(&w_cleaned)
    })
}

proptest! {
    #[test]
    fn filter_is_idempotent(dict in prop::collection::vec(ascii_word(), 0..5), input in ascii_text()) {
        let filter = Filter::build(&dict, true).unwrap();
        let mut once = input.clone().into_bytes();
        filter.filter(&mut once);
        let mut twice = once.clone();
        filter.filter(&mut twice);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn detection_and_filtering_agree(dict in prop::collection::vec(ascii_word(), 0..5), input in ascii_text()) {
        let filter = Filter::build(&dict, true).unwrap();
        let had_black_word = filter.has_black_word(input.as_bytes());
        let mut filtered = input.clone().into_bytes();
        filter.filter(&mut filtered);
        prop_assert_eq!(had_black_word, filtered != input.as_bytes());
    }

    #[test]
    fn agrees_with_brute_force_detection(dict in prop::collection::vec(ascii_word(), 0..5), input in ascii_text()) {
        let filter = Filter::build(&dict, true).unwrap();
        prop_assert_eq!(filter.has_black_word(input.as_bytes()), naive_contains(&dict, &input));
    }
}
