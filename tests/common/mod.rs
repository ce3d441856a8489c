#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Test fixture paths
pub struct TestFixtures {
    pub fixtures_dir: PathBuf,
}

impl TestFixtures {
    pub fn new() -> Self {
        let fixtures_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures");

        Self { fixtures_dir }
    }

    pub fn xml_valid_dir(&self) -> PathBuf {
        self.fixtures_dir.join("xml").join("valid")
    }

    pub fn xml_malformed_dir(&self) -> PathBuf {
        self.fixtures_dir.join("xml").join("malformed")
    }

    pub fn xml_encoded_dir(&self) -> PathBuf {
        self.fixtures_dir.join("xml").join("encoded")
    }

    pub fn simple_xml(&self) -> PathBuf {
        self.xml_valid_dir().join("simple.xml")
    }

    pub fn catalog_xml(&self) -> PathBuf {
        self.xml_valid_dir().join("catalog.xml")
    }

    pub fn mismatched_xml(&self) -> PathBuf {
        self.xml_malformed_dir().join("mismatched.xml")
    }

    pub fn external_entity_xml(&self) -> PathBuf {
        self.xml_malformed_dir().join("external_entity.xml")
    }

    pub fn utf8_bom_xml(&self) -> PathBuf {
        self.xml_encoded_dir().join("utf8_bom.xml")
    }

    pub fn utf16_bom_xml(&self) -> PathBuf {
        self.xml_encoded_dir().join("utf16le_bom.xml")
    }
}

/// Expected `prettify` output for `catalog.xml` with the default indent
pub const CATALOG_PRETTY: &str = "<?xml version='1.0' encoding='UTF-8'?>
<root>
    <item>
        <id>1</id>
        <name>Widget</name>
    </item>
    <item>
        <id>2</id>
        <name>Gadget &amp; Gizmo</name>
    </item>
</root>";

/// Copy a fixture into `dir` so tests can overwrite it
pub fn copy_fixture(source: &Path, dir: &TempDir) -> PathBuf {
    let name = source.file_name().expect("fixture has a file name");
    let target = dir.path().join(name);
    std::fs::copy(source, &target).expect("copy fixture");
    target
}
