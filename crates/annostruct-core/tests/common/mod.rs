#![allow(dead_code)]

use annostruct::core::models::atom::Element;
use annostruct::core::models::builder::StructureBuilder;
use annostruct::core::models::chain::ChainType;
use annostruct::core::models::ids::{ChainId, GroupId};
use annostruct::core::models::structure::Structure;
use annostruct::engine::config::EngineConfig;
use annostruct::engine::registry::ProviderRegistry;
use annostruct::engine::resolver::Resolver;
use nalgebra::Point3;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Chain A holds GLY 10, ALA 11 and SER 12 (N, CA, C each); chain B holds water 1.
pub fn create_test_structure() -> Structure {
    let mut builder = StructureBuilder::new("1TST");
    builder.start_chain("A", ChainType::Protein);
    let mut serial = 0;
    for (number, name) in [(10, "GLY"), (11, "ALA"), (12, "SER")] {
        builder.start_group(number, None, name);
        let x = number as f64 * 3.8;
        for (offset, (atom_name, element)) in [("N", Element::N), ("CA", Element::C), ("C", Element::C)]
            .into_iter()
            .enumerate()
        {
            serial += 1;
            builder.add_atom(serial, atom_name, element, Point3::new(x + offset as f64, 0.0, 0.0));
        }
    }
    builder.start_chain("B", ChainType::Water);
    builder.start_group(1, None, "HOH");
    builder.add_atom(100, "O", Element::O, Point3::new(0.0, 20.0, 0.0));
    builder.build().unwrap()
}

pub fn chain(structure: &Structure, name: &str) -> ChainId {
    structure.find_chain(name).unwrap()
}

pub fn group(structure: &Structure, chain_name: &str, number: isize) -> GroupId {
    structure
        .find_group(chain(structure, chain_name), number, None)
        .unwrap()
}

pub fn sealed_resolver(registry: &ProviderRegistry) -> Resolver {
    registry.seal();
    Resolver::new(registry, EngineConfig::default()).unwrap()
}

/// Shared execution counter for providers under test.
#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
