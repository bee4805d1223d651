use crate::core::models::ids::{GroupId, NodeId, NodeKind};
use crate::core::utils::geometry::centroid;
use crate::engine::context::ComputeContext;
use crate::engine::error::FeatureError;
use crate::engine::provider::{FeatureProvider, ProviderDescriptor};
use crate::features::kind::FeatureKind;
use nalgebra::Point3;

pub const GROUP_CENTROID_PROVIDER: &str = "group-centroid";

/// Geometric center of a group's atoms, in Angstroms.
pub struct GroupCentroid;

impl FeatureKind for GroupCentroid {
    type Value = Point3<f64>;
    const NAME: &'static str = "GroupCentroid";
    const DEFAULT_PROVIDER: Option<&'static str> = Some(GROUP_CENTROID_PROVIDER);
}

#[derive(Debug, Default)]
pub struct GroupCentroidProvider;

impl GroupCentroidProvider {
    pub fn descriptor() -> ProviderDescriptor {
        ProviderDescriptor::new(GROUP_CENTROID_PROVIDER, NodeKind::Group, Self)
            .produces::<GroupCentroid>()
    }
}

impl FeatureProvider for GroupCentroidProvider {
    fn compute(&self, ctx: &mut ComputeContext<'_>, _node: NodeId) -> Result<(), FeatureError> {
        let structure = ctx.structure();
        let centroids: Vec<(GroupId, String, Option<Point3<f64>>)> = ctx
            .select()
            .as_filtered_groups()
            .map(|(id, group)| {
                let positions: Vec<Point3<f64>> = group
                    .atoms()
                    .iter()
                    .filter_map(|&atom_id| structure.atom(atom_id))
                    .map(|atom| atom.position)
                    .collect();
                (id, format!("{} {}", group.name, group.residue_label()), centroid(&positions))
            })
            .collect();

        for (group_id, label, center) in centroids {
            let center =
                center.ok_or_else(|| ctx.failure(format!("group {} has no atoms", label)))?;
            ctx.set::<GroupCentroid>(group_id, center)?;
        }
        Ok(())
    }
}
