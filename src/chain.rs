//! Kinematic chain of the mobile C-arm.
//!
//! The chain is an arena of [`TransformNode`]s. Each node stores the index of its parent,
//! which always precedes it in the arena, so a single forward pass resolves every world
//! transform with parents computed before their children.

use crate::config::GantryConfig;
use crate::controls::{Control, ControlState};
use crate::transform::Transform;
use crate::vector::{Axis, Vec3};

/// Named nodes of the gantry, in chain order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeId {
    Cart,
    Column,
    Lift,
    Shoulder,
    WigWag,
    CSlide,
    Source,
    Detector,
}

impl NodeId {
    pub const COUNT: usize = 8;

    pub const ALL: [NodeId; NodeId::COUNT] = [
        NodeId::Cart,
        NodeId::Column,
        NodeId::Lift,
        NodeId::Shoulder,
        NodeId::WigWag,
        NodeId::CSlide,
        NodeId::Source,
        NodeId::Detector,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            NodeId::Cart => "cart",
            NodeId::Column => "column",
            NodeId::Lift => "lift",
            NodeId::Shoulder => "shoulder",
            NodeId::WigWag => "wig_wag",
            NodeId::CSlide => "c_slide",
            NodeId::Source => "source",
            NodeId::Detector => "detector",
        }
    }

    pub fn from_name(name: &str) -> Option<NodeId> {
        NodeId::ALL.into_iter().find(|id| id.name() == name)
    }
}

/// How a node's local transform depends on the controls.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Joint {
    Fixed,
    /// Planar translation of the cart on the floor.
    Carriage { longitudinal: Control, lateral: Control },
    /// Translation along an axis by the control value (meters).
    Slide { control: Control, axis: Axis },
    /// Rotation about an axis by the control value (degrees).
    Revolute { control: Control, axis: Axis },
}

impl Joint {
    fn transform(&self, controls: &ControlState) -> Transform {
        match *self {
            Joint::Fixed => Transform::IDENTITY,
            Joint::Carriage { longitudinal, lateral } => {
                Transform::from_translation([controls.get(longitudinal), 0.0, controls.get(lateral)])
            }
            Joint::Slide { control, axis } => {
                let mut t = [0.0; 3];
                t[axis.index()] = controls.get(control);
                Transform::from_translation(t)
            }
            Joint::Revolute { control, axis } => {
                let angle = controls.get(control).to_radians();
                match axis {
                    Axis::X => Transform::rotation_x(angle),
                    Axis::Y => Transform::rotation_y(angle),
                    Axis::Z => Transform::rotation_z(angle),
                }
            }
        }
    }

    pub fn controls(&self) -> Vec<Control> {
        match *self {
            Joint::Fixed => Vec::new(),
            Joint::Carriage { longitudinal, lateral } => vec![longitudinal, lateral],
            Joint::Slide { control, .. } | Joint::Revolute { control, .. } => vec![control],
        }
    }
}

#[derive(Clone, Debug)]
pub struct TransformNode {
    pub id: NodeId,
    pub parent: Option<usize>,
    /// Fixed translation relative to the parent, applied before the joint motion.
    pub offset: Vec3,
    pub joint: Joint,
    local: Transform,
    world: Transform,
}

impl TransformNode {
    pub fn world(&self) -> &Transform {
        &self.world
    }
}

#[derive(Clone, Debug)]
pub struct KinematicChain {
    nodes: Vec<TransformNode>,
}

impl KinematicChain {
    /// Builds the fixed chain cart → column → lift → shoulder → wig-wag → C-slide →
    /// {source, detector}.
    pub fn from_gantry(gantry: &GantryConfig) -> Self {
        let mut chain = KinematicChain { nodes: Vec::with_capacity(NodeId::COUNT) };
        chain.push(
            NodeId::Cart,
            None,
            gantry.cart_base,
            Joint::Carriage { longitudinal: Control::CartX, lateral: Control::CartZ },
        );
        chain.push(
            NodeId::Column,
            Some(NodeId::Cart),
            [0.0; 3],
            Joint::Revolute { control: Control::ColumnRotation, axis: Axis::Y },
        );
        chain.push(
            NodeId::Lift,
            Some(NodeId::Column),
            [0.0, gantry.column_height, 0.0],
            Joint::Slide { control: Control::Lift, axis: Axis::Y },
        );
        chain.push(NodeId::Shoulder, Some(NodeId::Lift), [0.0, 0.0, -gantry.arm_reach], Joint::Fixed);
        chain.push(
            NodeId::WigWag,
            Some(NodeId::Shoulder),
            [0.0; 3],
            Joint::Revolute { control: Control::WigWag, axis: Axis::Y },
        );
        chain.push(
            NodeId::CSlide,
            Some(NodeId::WigWag),
            [0.0; 3],
            Joint::Revolute { control: Control::Orbital, axis: Axis::X },
        );
        chain.push(NodeId::Source, Some(NodeId::CSlide), [0.0, gantry.source_offset, 0.0], Joint::Fixed);
        chain.push(NodeId::Detector, Some(NodeId::CSlide), [0.0, gantry.detector_offset, 0.0], Joint::Fixed);
        chain
    }

    fn push(&mut self, id: NodeId, parent: Option<NodeId>, offset: Vec3, joint: Joint) {
        debug_assert_eq!(id.index(), self.nodes.len(), "nodes must be pushed in NodeId order");
        let parent = parent.map(NodeId::index);
        debug_assert!(parent.is_none_or(|p| p < self.nodes.len()), "parent must precede child");
        let local = Transform::from_translation(offset);
        self.nodes.push(TransformNode { id, parent, offset, joint, local, world: local });
    }

    /// Recomputes every local transform from the controls.
    pub fn apply_controls(&mut self, controls: &ControlState) {
        for node in &mut self.nodes {
            node.local = Transform::from_translation(node.offset).then(&node.joint.transform(controls));
        }
    }

    /// Single parent-before-child pass over the arena.
    pub fn update_world(&mut self, root: &Transform) {
        for i in 0..self.nodes.len() {
            let parent_world = match self.nodes[i].parent {
                Some(p) => self.nodes[p].world,
                None => *root,
            };
            self.nodes[i].world = parent_world.then(&self.nodes[i].local);
        }
    }

    /// Applies the controls and resolves world transforms with the world origin as root.
    pub fn update(&mut self, controls: &ControlState) {
        self.apply_controls(controls);
        self.update_world(&Transform::IDENTITY);
    }

    pub fn node(&self, id: NodeId) -> &TransformNode {
        &self.nodes[id.index()]
    }

    pub fn nodes(&self) -> &[TransformNode] {
        &self.nodes
    }

    pub fn world(&self, id: NodeId) -> &Transform {
        &self.nodes[id.index()].world
    }

    pub fn world_position(&self, id: NodeId) -> Vec3 {
        self.nodes[id.index()].world.translation
    }

    /// The node driven by a control.
    pub fn node_for(&self, control: Control) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|n| n.joint.controls().contains(&control))
            .map(|n| n.id)
    }
}
