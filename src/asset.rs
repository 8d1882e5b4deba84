use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::engine::Aabb;

/// Die description parsed from a template asset file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DieTemplate {
    pub name: String,
    pub size: Vec3,
    pub color: Vec3,
}

impl DieTemplate {
    /// Parses the XML die description shipped alongside the demo.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid die template XML")?;
        let root = document.root_element();
        if !root.has_tag_name("die") {
            return Err(anyhow!("expected a <die> document"));
        }

        let name = required_text(&root, "name")?;
        let size = parse_vec3(&required_text(&root, "size")?)?;
        if size.min_element() <= 0.0 {
            return Err(anyhow!("die size components must be positive"));
        }
        let color = match optional_text(&root, "color") {
            Some(text) => parse_color(&text)?,
            None => Vec3::ONE,
        };

        Ok(Self { name, size, color })
    }

    /// Bounding box of the die geometry, centered on the origin.
    pub fn bounds(&self) -> Aabb {
        Aabb::from_size(self.size)
    }
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_vec3(value: &str) -> Result<Vec3> {
    let mut numbers = value
        .split_whitespace()
        .filter_map(|component| component.parse::<f32>().ok());
    let x = numbers
        .next()
        .ok_or_else(|| anyhow!("vector is missing components"))?;
    let y = numbers
        .next()
        .ok_or_else(|| anyhow!("vector is missing components"))?;
    let z = numbers
        .next()
        .ok_or_else(|| anyhow!("vector is missing components"))?;
    Ok(Vec3::new(x, y, z))
}

fn parse_color(value: &str) -> Result<Vec3> {
    let rgb = parse_vec3(value).context("color is missing components")?;
    Ok(rgb / 255.0)
}
