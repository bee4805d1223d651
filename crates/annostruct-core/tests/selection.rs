mod common;

use annostruct::core::models::atom::Element;
use annostruct::core::models::ids::NodeId;
use annostruct::engine::registry::ProviderRegistry;
use annostruct::providers::centroid::GroupCentroid;
use annostruct::providers::register_reference_providers;
use annostruct::selection::{Selection, SelectionError};
use common::{chain, create_test_structure, group, sealed_resolver};
use nalgebra::Point3;

#[test]
fn single_residue_of_a_named_chain() {
    let structure = create_test_structure();
    let (id, residue) = structure
        .select()
        .chain_name(&["A"])
        .residue_number(&[11])
        .as_group()
        .unwrap();

    assert_eq!(id, group(&structure, "A", 11));
    assert_eq!(residue.name, "ALA");
}

#[test]
fn unknown_chain_selects_nothing() {
    let structure = create_test_structure();
    let selection = structure.select().chain_name(&["C"]);

    assert!(selection.as_optional_chain().is_none());
    assert!(matches!(
        selection.as_chain(),
        Err(SelectionError::NoSuchElement { .. })
    ));
    assert!(selection.as_view().is_empty());
}

#[test]
fn several_chain_names_select_several_chains() {
    let structure = create_test_structure();
    let selection = structure.select().chain_name(&["A", "B"]);

    assert_eq!(selection.as_filtered_chains().count(), 2);
    assert!(matches!(
        selection.as_chain(),
        Err(SelectionError::Ambiguous { count: 2, .. })
    ));
}

#[test]
fn negated_criteria_select_the_complement() {
    let structure = create_test_structure();
    let non_nitrogen_outside_glycine: Vec<usize> = structure
        .select()
        .negation_mode_enter()
        .group_name(&["GLY"])
        .element(&[Element::N])
        .negation_mode_leave()
        .amino_acids()
        .as_filtered_atoms()
        .map(|(_, atom)| atom.serial)
        .collect();

    assert_eq!(non_nitrogen_outside_glycine, vec![5, 6, 8, 9]);
}

#[test]
fn distance_criteria_use_a_strict_cutoff() {
    let structure = create_test_structure();
    let around_water = structure
        .select()
        .atom_distance(Point3::new(0.0, 20.0, 0.0), 1.0)
        .as_view();

    assert_eq!(around_water.atoms().count(), 1);
    assert_eq!(around_water.chain_ids(), &[chain(&structure, "B")]);
}

#[test]
fn features_computed_on_the_source_are_visible_through_a_view() {
    let registry = ProviderRegistry::new();
    register_reference_providers(&registry).unwrap();
    let resolver = sealed_resolver(&registry);
    let mut structure = create_test_structure();
    let ser = group(&structure, "A", 12);
    let expected = resolver.get::<GroupCentroid>(&mut structure, ser).unwrap();

    let view = Selection::new(&structure).residue_range(11..=12).as_view();
    let through_view = view
        .feature_store(ser)
        .unwrap()
        .get::<GroupCentroid>()
        .unwrap();

    assert_eq!(*through_view, *expected);
    assert!(view.contains(ser));
    assert!(!view.contains(group(&structure, "A", 10)));
}

#[test]
fn isolated_copies_do_not_share_features() {
    let registry = ProviderRegistry::new();
    register_reference_providers(&registry).unwrap();
    let resolver = sealed_resolver(&registry);
    let mut structure = create_test_structure();
    let gly = group(&structure, "A", 10);
    resolver.get::<GroupCentroid>(&mut structure, gly).unwrap();

    let mut copy = structure
        .select()
        .chain_name(&["A"])
        .name_container("chain A")
        .as_isolated_structure();
    assert_eq!(copy.identifier(), "chain A");
    assert_eq!(copy.group_count(), 3);

    let copied_gly = group(&copy, "A", 10);
    assert!(
        !copy
            .feature_store(NodeId::Group(copied_gly))
            .unwrap()
            .contains::<GroupCentroid>()
    );

    resolver.get::<GroupCentroid>(&mut copy, copied_gly).unwrap();
    let original = structure.feature_store(NodeId::Group(gly)).unwrap();
    assert_eq!(original.len(), 1);
}
