// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Negation-aware merging of rule chains along a policy source chain.

use itertools::{Either, Itertools};
use palisade_types::rules::{RuleEntry, Rules, NO_RULES_SET};

/// Reduce an ordered chain of policy sources into the applicable rules
///
/// Sources are visited in traversal order (data type first, then ancestors
/// from the farthest down to the target itself). Default chains contribute
/// nothing. `None` means no policy applies at all.
pub(crate) fn merge_chain<'a, T, I>(sources: I) -> Option<Rules<T>>
where
    T: Clone + 'a,
    I: Iterator<Item = &'a Rules<T>>,
{
    let mut accumulated = None;

    for rules in sources {
        if rules.is_default() {
            continue;
        }
        accumulated = Some(merge(accumulated, rules.clone()));
    }

    accumulated
}

/// Merge one source's rules into the accumulator
///
/// Rule lists are concatenated in (accumulated, new) order, then every
/// negation carried by `new` removes all same-named rules from the
/// concatenated list. Negations never appear in the result, which also
/// holds for the first source entering an empty accumulator.
fn merge<T>(accumulated: Option<Rules<T>>, new: Rules<T>) -> Rules<T> {
    let (message, mut entries) = match accumulated {
        None => (new.message().to_owned(), Vec::new()),
        Some(accumulated) => {
            let message = combine_messages(accumulated.message(), new.message());
            (message, accumulated.into_entries())
        }
    };

    let (new_entries, negations): (Vec<RuleEntry>, Vec<String>) = new
        .into_entries()
        .into_iter()
        .partition_map(|entry| match entry {
            RuleEntry::Negation { target } => Either::Right(target),
            entry => Either::Left(entry),
        });

    entries.extend(new_entries);
    for target in &negations {
        entries.retain(|entry| entry.name() != Some(target));
    }

    Rules::from_parts(message, entries)
}

/// Combine two source messages
///
/// Non-sentinel messages concatenate in traversal order; a sentinel is
/// replaced by a non-sentinel counterpart.
fn combine_messages(accumulated: &str, new: &str) -> String {
    match (accumulated == NO_RULES_SET, new == NO_RULES_SET) {
        (false, false) => format!("{accumulated}, {new}"),
        (true, false) => new.to_owned(),
        _ => accumulated.to_owned(),
    }
}
