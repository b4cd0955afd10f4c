//! Files uploaded to a datastore (`pve:storage:File`).

use crate::error::Result;
use crate::schema::{FieldSchema, ResourceSchema};
use crate::value::PropertyMap;

use super::{string_at, ResourceKind, ResourceModel};

const SOURCE_RAW_FIELDS: &[FieldSchema] = &[
    FieldSchema::string("fileName")
        .required()
        .force_replace()
        .describe("The name of the file"),
    FieldSchema::string("fileData")
        .required()
        .force_replace()
        .describe("The raw file contents"),
];

// Every field forces a replace: a file is rewritten, never patched.
const FILE_FIELDS: &[FieldSchema] = &[
    FieldSchema::string("contentType")
        .required()
        .force_replace()
        .describe("The type of the file (e.g: snippets)"),
    FieldSchema::string("datastoreId")
        .required()
        .force_replace()
        .describe("The datastore to upload the file to (e.g: ceph-ha)"),
    FieldSchema::object("sourceRaw", SOURCE_RAW_FIELDS)
        .required()
        .force_replace()
        .describe("The raw source data"),
];

pub static FILE_SCHEMA: ResourceSchema = ResourceSchema {
    type_token: "pve:storage:File",
    description: "A file stored in a Proxmox datastore.",
    fields: FILE_FIELDS,
    delete_before_replace: false,
};

/// Raw source of an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSourceRaw {
    pub file_name: String,
    pub file_data: String,
}

/// Desired state of a datastore file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInputs {
    pub content_type: String,
    pub datastore_id: String,
    pub source_raw: FileSourceRaw,
}

impl FileInputs {
    pub fn new(
        content_type: impl Into<String>,
        datastore_id: impl Into<String>,
        file_name: impl Into<String>,
        file_data: impl Into<String>,
    ) -> Self {
        Self {
            content_type: content_type.into(),
            datastore_id: datastore_id.into(),
            source_raw: FileSourceRaw {
                file_name: file_name.into(),
                file_data: file_data.into(),
            },
        }
    }

    /// Path of the file on the cluster's shared storage mount.
    pub fn remote_path(&self) -> String {
        format!(
            "/mnt/pve/{}/{}/{}",
            self.datastore_id, self.content_type, self.source_raw.file_name
        )
    }
}

impl ResourceModel for FileInputs {
    const KIND: ResourceKind = ResourceKind::File;

    fn to_properties(&self) -> PropertyMap {
        let mut source = PropertyMap::new();
        source.insert("fileName".into(), self.source_raw.file_name.clone().into());
        source.insert("fileData".into(), self.source_raw.file_data.clone().into());

        let mut props = PropertyMap::new();
        props.insert("contentType".into(), self.content_type.clone().into());
        props.insert("datastoreId".into(), self.datastore_id.clone().into());
        props.insert("sourceRaw".into(), source.into());
        props
    }

    fn from_validated(props: &PropertyMap) -> Result<Self> {
        Ok(Self::new(
            string_at(Self::KIND, props, "contentType")?,
            string_at(Self::KIND, props, "datastoreId")?,
            string_at(Self::KIND, props, "sourceRaw.fileName")?,
            string_at(Self::KIND, props, "sourceRaw.fileData")?,
        ))
    }
}
