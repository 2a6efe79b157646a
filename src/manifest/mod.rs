// src/manifest/mod.rs

//! Add-on manifest (addon.xml) model
//!
//! Every add-on archive carries an `addon.xml` manifest. Its metadata lives
//! in an `<extension>` child of the root element, marked by the `point`
//! attribute. Current manifests use `kodi.addon.metadata`; older ones still
//! use `xbmc.addon.metadata`.

pub mod enrich;
mod xml;

pub use enrich::{
    apply_enrichment, enrich_archive, missing_assets, read_manifest, Enrichment,
    AUXILIARY_ASSETS, MANIFEST_FILE,
};
pub use xml::{Element, Node};

use crate::error::Result;

/// Name of the element that carries extension points
pub const EXTENSION_ELEMENT: &str = "extension";

/// Attribute naming the extension point
pub const POINT_ATTRIBUTE: &str = "point";

/// The two markers of the metadata extension point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataPoint {
    /// `kodi.addon.metadata`
    Kodi,
    /// `xbmc.addon.metadata` (legacy)
    Xbmc,
}

impl MetadataPoint {
    /// Lookup order: current marker first
    pub const ALL: [MetadataPoint; 2] = [MetadataPoint::Kodi, MetadataPoint::Xbmc];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kodi => "kodi.addon.metadata",
            Self::Xbmc => "xbmc.addon.metadata",
        }
    }
}

/// A parsed add-on manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonManifest {
    root: Element,
}

impl AddonManifest {
    pub fn parse(xml: &str) -> Result<Self> {
        Ok(Self {
            root: Element::parse(xml)?,
        })
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn into_element(self) -> Element {
        self.root
    }

    /// Add-on id declared by the manifest itself
    #[cfg(test)]
    pub(crate) fn id(&self) -> Option<&str> {
        self.root.attribute("id")
    }

    /// Which metadata marker the manifest uses, if any
    #[cfg(test)]
    pub(crate) fn metadata_point(&self) -> Option<MetadataPoint> {
        MetadataPoint::ALL
            .into_iter()
            .find(|point| self.metadata_index(*point).is_some())
    }

    /// The metadata section, trying the current marker before the legacy one
    pub fn metadata_mut(&mut self) -> Option<&mut Element> {
        let index = MetadataPoint::ALL
            .into_iter()
            .find_map(|point| self.metadata_index(point))?;
        self.root.child_at_mut(index)
    }

    fn metadata_index(&self, point: MetadataPoint) -> Option<usize> {
        self.root
            .position_of_child(EXTENSION_ELEMENT, POINT_ATTRIBUTE, point.as_str())
    }
}
