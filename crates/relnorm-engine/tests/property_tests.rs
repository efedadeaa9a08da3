use proptest::prelude::*;
use relnorm_engine::attrs::AttrSet;
use relnorm_engine::budget::AnalysisBudget;
use relnorm_engine::chase::{chase, chase_with_budget};
use relnorm_engine::closure::closure_of;
use relnorm_engine::cover::minimal_cover;
use relnorm_engine::fd::{equivalent, implies, Fd, RelationSchema};
use relnorm_engine::keys::candidate_keys;
use relnorm_engine::preservation::{check_preservation, check_preservation_with_budget};
use relnorm_engine::synthesis::synthesize_3nf;

const LETTERS: [&str; 6] = ["A", "B", "C", "D", "E", "F"];

fn from_mask(mask: u8) -> AttrSet {
    LETTERS
        .iter()
        .enumerate()
        .filter(|(i, _)| mask & (1 << i) != 0)
        .map(|(_, a)| *a)
        .collect()
}

fn attr_set() -> impl Strategy<Value = AttrSet> {
    (0u8..64).prop_map(from_mask)
}

fn fd() -> impl Strategy<Value = Fd> {
    (1u8..64, 1u8..64).prop_map(|(l, r)| Fd::new(from_mask(l), from_mask(r)))
}

fn fd_set() -> impl Strategy<Value = Vec<Fd>> {
    prop::collection::vec(fd(), 1..=7)
}

/// FD sets over A..F, sometimes with an extra attribute `G` no FD mentions.
fn schema() -> impl Strategy<Value = RelationSchema> {
    (fd_set(), any::<bool>()).prop_map(|(fds, extra)| {
        let declared = if extra { AttrSet::letters("G") } else { AttrSet::new() };
        RelationSchema::new(declared, fds)
    })
}

/// A schema and the same schema with its FDs in shuffled order.
fn reordered_schema() -> impl Strategy<Value = (RelationSchema, RelationSchema)> {
    schema().prop_flat_map(|original| {
        let universe = original.universe.clone();
        (Just(original.clone()), Just(original.fds).prop_shuffle())
            .prop_map(move |(original, fds)| (original, RelationSchema::new(universe.clone(), fds)))
    })
}

/// Up to three relations from `parts`, plus one holding whatever they miss.
fn covering(universe: &AttrSet, parts: Vec<AttrSet>) -> Vec<AttrSet> {
    let mut rho: Vec<AttrSet> = parts.iter().map(|p| p.intersection(universe)).collect();
    let covered = rho.iter().fold(AttrSet::new(), |acc, r| acc.union(r));
    let missing = universe.difference(&covered);
    if !missing.is_empty() {
        rho.push(missing);
    }
    rho
}

fn subsets(universe: &AttrSet) -> Vec<AttrSet> {
    let attrs: Vec<&String> = universe.iter().collect();
    (0u32..(1 << attrs.len()))
        .map(|mask| {
            attrs
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, a)| (*a).clone())
                .collect()
        })
        .collect()
}

fn brute_force_keys(schema: &RelationSchema) -> Vec<AttrSet> {
    let mut keys: Vec<AttrSet> = subsets(&schema.universe)
        .into_iter()
        .filter(|k| schema.is_superkey(k))
        .filter(|k| k.iter().all(|a| !schema.is_superkey(&k.without(a))))
        .collect();
    keys.sort();
    keys
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn closure_contains_seed_and_is_monotone(fds in fd_set(), x in attr_set(), extra in attr_set()) {
        let y = x.union(&extra);
        let cx = closure_of(&x, &fds);
        let cy = closure_of(&y, &fds);
        prop_assert!(x.is_subset(&cx));
        prop_assert!(cx.is_subset(&cy));
    }

    #[test]
    fn closure_is_idempotent(fds in fd_set(), x in attr_set()) {
        let once = closure_of(&x, &fds);
        prop_assert_eq!(closure_of(&once, &fds), once);
    }

    #[test]
    fn cover_is_equivalent(fds in fd_set()) {
        let cover = minimal_cover(&fds);
        prop_assert!(equivalent(&fds, &cover.fds));
        let schema = RelationSchema::from_fds(fds.clone());
        for x in subsets(&schema.universe) {
            prop_assert_eq!(closure_of(&x, &fds), closure_of(&x, &cover.fds));
        }
    }

    #[test]
    fn cover_is_minimal(fds in fd_set()) {
        let cover = minimal_cover(&fds).fds;
        for (i, fd) in cover.iter().enumerate() {
            prop_assert_eq!(fd.rhs.len(), 1);

            let rest: Vec<Fd> = cover
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, f)| f.clone())
                .collect();
            prop_assert!(!implies(&rest, fd), "{} is redundant", fd);

            if fd.lhs.len() > 1 {
                for a in &fd.lhs {
                    let reduced = Fd::new(fd.lhs.without(a), fd.rhs.clone());
                    prop_assert!(!implies(&cover, &reduced), "{} is extraneous in {}", a, fd);
                }
            }
        }
    }

    #[test]
    fn key_search_finds_exactly_the_minimal_keys(schema in schema()) {
        let search = candidate_keys(&schema);
        prop_assert!(!search.hit_node_cap);
        let mut found = search.keys.clone();
        found.sort();
        prop_assert_eq!(found, brute_force_keys(&schema));
    }

    #[test]
    fn synthesis_is_lossless_and_preserving(schema in schema()) {
        let out = synthesize_3nf(&schema);
        let rho = out.decomposition();

        let covered = rho.iter().fold(AttrSet::new(), |acc, r| acc.union(r));
        prop_assert_eq!(&covered, &schema.universe);

        let chased = chase(&schema, &rho);
        prop_assert!(chased.is_lossless);
        prop_assert!(!chased.hit_iteration_cap);

        let preserved = check_preservation(&schema, &rho);
        prop_assert!(preserved.all_preserved);
    }

    #[test]
    fn universe_member_is_lossless_without_steps(schema in schema(), extra in attr_set()) {
        let rho = vec![extra, schema.universe.clone()];
        let result = chase(&schema, &rho);
        prop_assert!(result.is_lossless);
        prop_assert_eq!(result.passes, 0);
        prop_assert!(result.steps.is_empty());
    }

    #[test]
    fn fd_inside_one_relation_is_preserved(schema in schema()) {
        let rho: Vec<AttrSet> = schema.fds.iter().map(Fd::attributes).collect();
        let report = check_preservation(&schema, &rho);
        prop_assert!(report.all_preserved);
        prop_assert!(report.per_fd.iter().all(|p| p.trivial_relation.is_some()));
    }

    #[test]
    fn results_do_not_depend_on_fd_order(
        (original, reordered) in reordered_schema(),
        x in attr_set(),
        parts in prop::collection::vec(attr_set(), 1..=3),
    ) {
        prop_assert_eq!(&original.universe, &reordered.universe);
        prop_assert_eq!(closure_of(&x, &original.fds), closure_of(&x, &reordered.fds));

        let mut keys = candidate_keys(&original).keys;
        let mut reordered_keys = candidate_keys(&reordered).keys;
        keys.sort();
        reordered_keys.sort();
        prop_assert_eq!(keys, reordered_keys);

        let budget = AnalysisBudget::unlimited();
        let rho = covering(&original.universe, parts);
        prop_assert_eq!(
            chase_with_budget(&original, &rho, &budget).is_lossless,
            chase_with_budget(&reordered, &rho, &budget).is_lossless
        );
        prop_assert_eq!(
            check_preservation_with_budget(&original, &rho, &budget).all_preserved,
            check_preservation_with_budget(&reordered, &rho, &budget).all_preserved
        );
    }
}
