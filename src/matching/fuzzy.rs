use crate::metadata::SearchCandidate;

/// Levenshtein edit distance over Unicode scalar values.
///
/// Insertions, deletions and substitutions each cost 1. Case-sensitive.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Two rows of the DP table
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            let deletion = previous[j + 1] + 1;
            let insertion = current[j] + 1;
            current[j + 1] = substitution.min(deletion).min(insertion);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

/// The candidate whose name is closest to `target`.
///
/// Nameless candidates are ignored. Ties go to the earliest candidate.
pub fn closest_match<'a>(target: &str, candidates: &'a [SearchCandidate]) -> Option<&'a SearchCandidate> {
    candidates
        .iter()
        .filter_map(|candidate| {
            candidate
                .name
                .as_deref()
                .map(|name| (levenshtein(name, target), candidate))
        })
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate)
}
