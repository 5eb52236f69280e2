//! Cross-kernel laws, exercised both on fixed examples and on random
//! regexes.

use proptest::prelude::*;

use crate::fa::FiniteAutomaton;
use crate::regex::Regex;
use crate::symbol::Symbol;

fn words_up_to(alphabet: &[char], len: usize) -> Vec<String> {
    let mut words = vec![String::new()];
    let mut frontier = vec![String::new()];
    for _ in 0..len {
        let mut next = Vec::new();
        for word in &frontier {
            for &c in alphabet {
                let mut w = word.clone();
                w.push(c);
                next.push(w);
            }
        }
        words.extend(next.iter().cloned());
        frontier = next;
    }
    words
}

/// Random regex text over {a, b}: symbols, alternation, concatenation and
/// iteration, bounded depth.
fn regex_text() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![Just("a".to_string()), Just("b".to_string())];
    leaf.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(l, r)| format!("({}|{})", l, r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| format!("{}{}", l, r)),
            inner.prop_map(|x| format!("({})*", x)),
        ]
    })
}

#[test]
fn minimized_dfas_agree_iff_languages_agree() {
    let same = [("(a|b)*", "(a*b*)*"), ("a|b", "b|a"), ("(ab)*ab", "ab(ab)*")];
    for (x, y) in same {
        let rx = Regex::from_string(x).unwrap();
        let ry = Regex::from_string(y).unwrap();
        assert!(Regex::equivalent(&rx, &ry).unwrap(), "{} ≡ {}", x, y);
        assert!(FiniteAutomaton::equal(
            &rx.to_glushkov().minimize().unwrap(),
            &ry.to_glushkov().minimize().unwrap()
        ));
    }
    let different = [("a*", "a"), ("(a|b)*", "a*b*"), ("ab", "ba")];
    for (x, y) in different {
        let rx = Regex::from_string(x).unwrap();
        let ry = Regex::from_string(y).unwrap();
        assert!(!Regex::equivalent(&rx, &ry).unwrap(), "{} ≢ {}", x, y);
    }
}

#[test]
fn derivative_matches_membership() {
    let r = Regex::from_string("(a|b)*abb").unwrap();
    let fa = r.to_glushkov();
    for word in words_up_to(&['a', 'b'], 5) {
        let by_derivative = r
            .prefix_derivative(&word)
            .map(|d| d.contains_eps())
            .unwrap_or(false);
        assert_eq!(by_derivative, fa.accepts(&word), "word {:?}", word);
    }
}

#[test]
fn constructions_agree_on_membership() {
    for input in ["(a|b)*abb", "a*b", "a|b", "(ab)*", "a*b*a"] {
        let r = Regex::from_string(input).unwrap();
        let thompson = r.to_thompson();
        let glushkov = r.to_glushkov();
        let ilieyu = r.to_ilieyu();
        let antimirov = r.to_antimirov();
        for word in words_up_to(&['a', 'b'], 4) {
            let expected = thompson.accepts(&word);
            assert_eq!(glushkov.accepts(&word), expected, "{} / {:?}", input, word);
            assert_eq!(ilieyu.accepts(&word), expected, "{} / {:?}", input, word);
            assert_eq!(antimirov.accepts(&word), expected, "{} / {:?}", input, word);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn determinize_is_idempotent(input in regex_text()) {
        let nfa = Regex::from_string(&input).unwrap().to_thompson();
        let once = nfa.determinize(true).unwrap();
        let twice = once.determinize(true).unwrap();
        prop_assert!(FiniteAutomaton::equal(&once, &twice));
    }

    #[test]
    fn remove_eps_preserves_language_and_drops_eps(input in regex_text()) {
        let nfa = Regex::from_string(&input).unwrap().to_thompson();
        let cleaned = nfa.remove_eps();
        for state in cleaned.states() {
            prop_assert!(!state.transitions.contains_key(&Symbol::Epsilon));
        }
        for word in words_up_to(&['a', 'b'], 3) {
            prop_assert_eq!(nfa.accepts(&word), cleaned.accepts(&word));
        }
    }

    #[test]
    fn arden_round_trips(input in regex_text()) {
        let r = Regex::from_string(&input).unwrap();
        let back = r.to_thompson().to_regex().unwrap();
        prop_assert!(Regex::equivalent(&r, &back).unwrap());
    }

    #[test]
    fn intersection_by_word_sampling(x in regex_text(), y in regex_text()) {
        let a = Regex::from_string(&x).unwrap().to_glushkov();
        let b = Regex::from_string(&y).unwrap().to_glushkov();
        let inter = FiniteAutomaton::intersection(&a, &b).unwrap();
        for word in words_up_to(&['a', 'b'], 3) {
            prop_assert_eq!(
                inter.accepts(&word),
                a.accepts(&word) && b.accepts(&word)
            );
        }
    }

    #[test]
    fn minimization_is_sound_and_minimal(input in regex_text()) {
        let fa = Regex::from_string(&input).unwrap().to_glushkov();
        let min = fa.minimize().unwrap();
        prop_assert!(min.is_deterministic());
        for word in words_up_to(&['a', 'b'], 3) {
            prop_assert_eq!(fa.accepts(&word), min.accepts(&word));
        }
        prop_assert!(min.is_dfa_minimal().unwrap());
    }
}
