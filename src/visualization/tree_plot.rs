//! Tree structure diagram

use super::svg::{estimate_text_width, format_number, SvgDocument, SvgElement, TextAnchor};
use crate::error::{BikeTreeError, Result};
use crate::training::{DecisionTreeRegressor, TreeNode};

const MARGIN: f64 = 24.0;
const PAD_X: f64 = 10.0;
const PAD_Y: f64 = 8.0;
const H_GAP: f64 = 16.0;
const V_GAP: f64 = 44.0;
const LOW_COLOR: (u8, u8, u8) = (255, 255, 255);
const HIGH_COLOR: (u8, u8, u8) = (229, 129, 57);

/// A node with its text and grid position
#[derive(Debug)]
struct PlacedNode {
    /// Horizontal position in leaf slots (fractional for internal nodes)
    slot: f64,
    depth: usize,
    lines: Vec<String>,
    value: f64,
    children: Option<(usize, usize)>,
}

/// Renders a fitted regression tree as boxes joined by edges
#[derive(Debug, Clone)]
pub struct TreePlot {
    /// Font size of node text
    pub font_size: f64,
    /// Decimals shown for thresholds, errors and values
    pub precision: usize,
    /// Shade node boxes by their mean value
    pub filled: bool,
}

impl Default for TreePlot {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            precision: 3,
            filled: true,
        }
    }
}

impl TreePlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = size;
        self
    }

    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_filled(mut self, filled: bool) -> Self {
        self.filled = filled;
        self
    }

    /// Lay out and draw every node of `tree`
    pub fn render(
        &self,
        tree: &DecisionTreeRegressor,
        feature_names: &[String],
    ) -> Result<SvgDocument> {
        let root = tree.root().ok_or(BikeTreeError::ModelNotFitted)?;

        if feature_names.len() != tree.n_features() {
            return Err(BikeTreeError::ShapeError {
                expected: format!("{} feature names", tree.n_features()),
                actual: format!("{} feature names", feature_names.len()),
            });
        }

        let mut nodes = Vec::new();
        let mut next_leaf = 0usize;
        self.place(root, 0, feature_names, &mut nodes, &mut next_leaf);

        let n_leaves = next_leaf.max(1) as f64;
        let max_depth = nodes.iter().map(|n| n.depth).max().unwrap_or(0);
        let max_lines = nodes.iter().map(|n| n.lines.len()).max().unwrap_or(1);

        let box_width = nodes
            .iter()
            .flat_map(|n| n.lines.iter())
            .map(|line| estimate_text_width(line, self.font_size))
            .fold(0.0, f64::max)
            + 2.0 * PAD_X;
        let line_height = self.font_size * 1.4;
        let box_height = max_lines as f64 * line_height + 2.0 * PAD_Y;
        let slot_width = box_width + H_GAP;
        let level_height = box_height + V_GAP;

        let width = n_leaves * slot_width + 2.0 * MARGIN;
        let height = (max_depth + 1) as f64 * level_height - V_GAP + 2.0 * MARGIN;

        let center_x = |node: &PlacedNode| MARGIN + (node.slot + 0.5) * slot_width;
        let top_y = |node: &PlacedNode| MARGIN + node.depth as f64 * level_height;

        let (min_value, max_value) = nodes
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), n| {
                (lo.min(n.value), hi.max(n.value))
            });

        let mut doc = SvgDocument::new(width, height).with_title("Decision tree");

        // Edges first so boxes paint over their ends
        for (idx, node) in nodes.iter().enumerate() {
            let Some((left, right)) = node.children else {
                continue;
            };
            let x1 = center_x(node);
            let y1 = top_y(node) + box_height;
            for (child_idx, label) in [(left, "True"), (right, "False")] {
                let child = &nodes[child_idx];
                let x2 = center_x(child);
                let y2 = top_y(child);
                doc.push(SvgElement::line(x1, y1, x2, y2, "#555555"));

                if idx == 0 {
                    let anchor = if x2 < x1 { TextAnchor::End } else { TextAnchor::Start };
                    let offset = if x2 < x1 { -6.0 } else { 6.0 };
                    doc.push(SvgElement::text(
                        (x1 + x2) / 2.0 + offset,
                        (y1 + y2) / 2.0,
                        label,
                        self.font_size * 0.9,
                        anchor,
                    ));
                }
            }
        }

        for node in &nodes {
            let x = center_x(node) - box_width / 2.0;
            let y = top_y(node);
            let fill = if self.filled {
                value_color(node.value, min_value, max_value)
            } else {
                "#ffffff".to_string()
            };
            doc.push(SvgElement::boxed(x, y, box_width, box_height, &fill, "#000000"));

            // Vertically center the node's lines inside the box
            let text_block = node.lines.len() as f64 * line_height;
            let first_baseline = y + (box_height - text_block) / 2.0 + line_height * 0.75;
            for (i, line) in node.lines.iter().enumerate() {
                doc.push(SvgElement::text(
                    center_x(node),
                    first_baseline + i as f64 * line_height,
                    line.clone(),
                    self.font_size,
                    TextAnchor::Middle,
                ));
            }
        }

        Ok(doc)
    }

    /// Pre-order placement; returns the index of the placed node
    fn place(
        &self,
        node: &TreeNode,
        depth: usize,
        feature_names: &[String],
        nodes: &mut Vec<PlacedNode>,
        next_leaf: &mut usize,
    ) -> usize {
        let idx = nodes.len();
        nodes.push(PlacedNode {
            slot: 0.0,
            depth,
            lines: self.node_lines(node, feature_names),
            value: node.value(),
            children: None,
        });

        match node {
            TreeNode::Leaf { .. } => {
                nodes[idx].slot = *next_leaf as f64;
                *next_leaf += 1;
            }
            TreeNode::Split { left, right, .. } => {
                let l = self.place(left, depth + 1, feature_names, nodes, next_leaf);
                let r = self.place(right, depth + 1, feature_names, nodes, next_leaf);
                nodes[idx].slot = (nodes[l].slot + nodes[r].slot) / 2.0;
                nodes[idx].children = Some((l, r));
            }
        }

        idx
    }

    fn node_lines(&self, node: &TreeNode, feature_names: &[String]) -> Vec<String> {
        let mut lines = Vec::with_capacity(4);
        if let TreeNode::Split {
            feature_idx,
            threshold,
            ..
        } = node
        {
            lines.push(format!(
                "{} <= {}",
                feature_names[*feature_idx],
                format_number(*threshold, self.precision)
            ));
        }
        lines.push(format!(
            "squared_error = {}",
            format_number(node.impurity(), self.precision)
        ));
        lines.push(format!("samples = {}", node.n_samples()));
        lines.push(format!("value = {}", format_number(node.value(), self.precision)));
        lines
    }
}

fn value_color(value: f64, min: f64, max: f64) -> String {
    let t = if max > min { (value - min) / (max - min) } else { 0.0 };
    let mix = |lo: u8, hi: u8| -> u8 { (lo as f64 + (hi as f64 - lo as f64) * t).round() as u8 };
    format!(
        "#{:02x}{:02x}{:02x}",
        mix(LOW_COLOR.0, HIGH_COLOR.0),
        mix(LOW_COLOR.1, HIGH_COLOR.1),
        mix(LOW_COLOR.2, HIGH_COLOR.2)
    )
}
