use super::ids::GroupId;
use crate::features::store::FeatureStore;
use nalgebra::Point3;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The chemical element of an atom.
///
/// Covers the elements routinely found in protein structures; anything else is kept as
/// [`Element::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Element {
    H,
    C,
    N,
    O,
    S,
    P,
    Se,
    Fe,
    Zn,
    Mg,
    Ca,
    Na,
    K,
    Cl,
    Mn,
    Cu,
    #[default]
    Other,
}

impl Element {
    pub fn symbol(&self) -> &'static str {
        match self {
            Element::H => "H",
            Element::C => "C",
            Element::N => "N",
            Element::O => "O",
            Element::S => "S",
            Element::P => "P",
            Element::Se => "SE",
            Element::Fe => "FE",
            Element::Zn => "ZN",
            Element::Mg => "MG",
            Element::Ca => "CA",
            Element::Na => "NA",
            Element::K => "K",
            Element::Cl => "CL",
            Element::Mn => "MN",
            Element::Cu => "CU",
            Element::Other => "X",
        }
    }

    /// Deuterium and tritium are reported as hydrogen by structure files and count here too.
    pub fn is_hydrogen(&self) -> bool {
        matches!(self, Element::H)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown element symbol '{0}'")]
pub struct ParseElementError(pub String);

impl FromStr for Element {
    type Err = ParseElementError;

    /// Parses an element symbol, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "H" | "D" | "T" => Ok(Element::H),
            "C" => Ok(Element::C),
            "N" => Ok(Element::N),
            "O" => Ok(Element::O),
            "S" => Ok(Element::S),
            "P" => Ok(Element::P),
            "SE" => Ok(Element::Se),
            "FE" => Ok(Element::Fe),
            "ZN" => Ok(Element::Zn),
            "MG" => Ok(Element::Mg),
            "CA" => Ok(Element::Ca),
            "NA" => Ok(Element::Na),
            "K" => Ok(Element::K),
            "CL" => Ok(Element::Cl),
            "MN" => Ok(Element::Mn),
            "CU" => Ok(Element::Cu),
            "X" => Ok(Element::Other),
            other => Err(ParseElementError(other.to_string())),
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One physical atom.
///
/// The parent group is assigned when the atom is inserted into a
/// [`Structure`](super::structure::Structure) and never changes afterwards.
#[derive(Debug)]
pub struct Atom {
    /// The name of the atom (e.g., "CA", "N", "O").
    pub name: String,
    pub element: Element,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
    /// The serial number from the source file.
    pub serial: usize,
    pub(crate) group_id: GroupId,
    pub(crate) features: FeatureStore,
}

impl Atom {
    pub fn new(name: &str, element: Element, position: Point3<f64>) -> Self {
        Self {
            name: name.to_string(),
            element,
            position,
            serial: 0,
            group_id: GroupId::default(),
            features: FeatureStore::new(),
        }
    }

    pub fn with_serial(mut self, serial: usize) -> Self {
        self.serial = serial;
        self
    }

    pub fn group_id(&self) -> GroupId {
        self.group_id
    }

    pub fn features(&self) -> &FeatureStore {
        &self.features
    }

    /// Copies the raw atom data. The copy is unattached and starts with an empty store.
    pub fn detached_copy(&self) -> Self {
        Self {
            name: self.name.clone(),
            element: self.element,
            position: self.position,
            serial: self.serial,
            group_id: GroupId::default(),
            features: FeatureStore::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_atom_has_expected_default_fields() {
        let atom = Atom::new("CA", Element::C, Point3::new(1.0, 2.0, 3.0));

        assert_eq!(atom.name, "CA");
        assert_eq!(atom.element, Element::C);
        assert_eq!(atom.position, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(atom.serial, 0);
        assert_eq!(atom.group_id(), GroupId::default());
        assert!(atom.features().is_empty());
    }

    #[test]
    fn with_serial_sets_the_serial_number() {
        let atom = Atom::new("N", Element::N, Point3::origin()).with_serial(17);
        assert_eq!(atom.serial, 17);
    }

    #[test]
    fn detached_copy_keeps_raw_data() {
        let atom = Atom::new("OG", Element::O, Point3::new(0.5, 0.0, -1.0)).with_serial(3);
        let copy = atom.detached_copy();

        assert_eq!(copy.name, atom.name);
        assert_eq!(copy.element, atom.element);
        assert_eq!(copy.position, atom.position);
        assert_eq!(copy.serial, 3);
        assert!(copy.features().is_empty());
    }

    #[test]
    fn from_str_parses_symbols_case_insensitively() {
        assert_eq!(Element::from_str("c"), Ok(Element::C));
        assert_eq!(Element::from_str("Se"), Ok(Element::Se));
        assert_eq!(Element::from_str(" FE "), Ok(Element::Fe));
        assert_eq!(Element::from_str("D"), Ok(Element::H));
    }

    #[test]
    fn from_str_rejects_unknown_symbols() {
        assert_eq!(
            Element::from_str("Qq"),
            Err(ParseElementError("QQ".to_string()))
        );
        assert!(Element::from_str("").is_err());
    }

    #[test]
    fn hydrogen_detection_and_display() {
        assert!(Element::H.is_hydrogen());
        assert!(!Element::C.is_hydrogen());
        assert_eq!(Element::Zn.to_string(), "ZN");
    }
}
