// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! XML configuration loading.
//!
//! A configuration document declares the data types, domains/topics, and the
//! participants whose publishers/subscribers carry the named writers and
//! readers a connector exposes:
//!
//! ```xml
//! <dds>
//!   <types>
//!     <struct name="ShapeType">
//!       <member name="color" type="string" stringMaxLength="128"/>
//!       <member name="x" type="long"/>
//!       <member name="y" type="long"/>
//!     </struct>
//!   </types>
//!   <domain_library name="MyDomainLibrary">
//!     <domain name="MyDomain" domain_id="0">
//!       <register_type name="ShapeType" type_ref="ShapeType"/>
//!       <topic name="Square" register_type_ref="ShapeType"/>
//!     </domain>
//!   </domain_library>
//!   <domain_participant_library name="MyParticipantLibrary">
//!     <domain_participant name="Zero" domain_ref="MyDomainLibrary::MyDomain">
//!       <publisher name="MyPublisher">
//!         <data_writer name="MyWriter" topic_ref="Square"/>
//!       </publisher>
//!       <subscriber name="MySubscriber">
//!         <data_reader name="MyReader" topic_ref="Square"/>
//!       </subscriber>
//!     </domain_participant>
//!   </domain_participant_library>
//! </dds>
//! ```
//!
//! The configuration source is a file path, a `file://` URL, or inline XML
//! behind a `str://` prefix. A participant is selected with
//! `"LibraryName::ParticipantName"`, and entities are addressed as
//! `"PublisherName::WriterName"` / `"SubscriberName::ReaderName"`.

use crate::dynamic::{FieldDescriptor, PrimitiveKind, TypeDescriptor, TypeKind};
use crate::error::{Error, Result};
use roxmltree::{Document, Node};
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

/// One configured writer or reader endpoint.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Scoped entity name, e.g. `"MyPublisher::MyWriter"`.
    pub name: String,
    /// Fully scoped participant selector, e.g. `"MyParticipantLibrary::Zero"`.
    pub participant: String,
    /// Topic name the endpoint is bound to.
    pub topic: String,
    /// Registered type name for the topic.
    pub type_name: String,
    /// Declared data type of the topic.
    pub type_desc: Arc<TypeDescriptor>,
    /// Domain the participant lives in.
    pub domain_id: u32,
}

/// One configured participant with its endpoints.
#[derive(Debug, Clone)]
pub struct ParticipantConfig {
    pub name: String,
    pub domain_id: u32,
    pub writers: Vec<EndpointConfig>,
    pub readers: Vec<EndpointConfig>,
}

/// A parsed configuration document.
#[derive(Debug, Clone, Default)]
pub struct Configuration {
    participants: HashMap<String, ParticipantConfig>,
}

struct DomainConfig {
    domain_id: u32,
    /// topic name -> (registered type name, descriptor)
    topics: HashMap<String, (String, Arc<TypeDescriptor>)>,
}

impl Configuration {
    /// Load a configuration from a source string: `str://` inline XML,
    /// `file://` URL, or a plain file path.
    pub fn load(source: &str) -> Result<Self> {
        if let Some(inline) = source.strip_prefix("str://") {
            // The original URL convention wraps inline documents in quotes.
            let inline = inline
                .strip_prefix('"')
                .and_then(|s| s.strip_suffix('"'))
                .unwrap_or(inline);
            return Self::parse(inline);
        }

        let path = source.strip_prefix("file://").unwrap_or(source);
        let xml = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read '{}': {}", path, e)))?;
        Self::parse(&xml)
    }

    /// Parse a configuration document.
    pub fn parse(xml: &str) -> Result<Self> {
        let doc = Document::parse(xml).map_err(|e| Error::Config(format!("XML parse: {}", e)))?;
        let root = doc.root_element();
        if root.tag_name().name() != "dds" {
            return Err(Error::Config(format!(
                "expected <dds> document root, found <{}>",
                root.tag_name().name()
            )));
        }

        let types = parse_types(&root)?;
        let domains = parse_domain_libraries(&root, &types)?;
        let participants = parse_participant_libraries(&root, &domains)?;

        Ok(Self { participants })
    }

    /// Look up a participant by its `"Library::Name"` selector.
    pub fn participant(&self, selector: &str) -> Result<&ParticipantConfig> {
        self.participants.get(selector).ok_or_else(|| {
            Error::Config(format!(
                "participant '{}' not found in configuration",
                selector
            ))
        })
    }
}

fn elements<'a, 'input>(
    parent: &'a Node<'a, 'input>,
    tag: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    parent
        .children()
        .filter(move |n| n.is_element() && n.tag_name().name() == tag)
}

fn required_attr(node: &Node, attr: &str) -> Result<String> {
    node.attribute(attr).map(str::to_string).ok_or_else(|| {
        Error::Config(format!(
            "<{}> is missing the '{}' attribute",
            node.tag_name().name(),
            attr
        ))
    })
}

fn parse_types(root: &Node) -> Result<HashMap<String, Arc<TypeDescriptor>>> {
    let mut types: HashMap<String, Arc<TypeDescriptor>> = HashMap::new();

    for types_node in elements(root, "types") {
        for struct_node in elements(&types_node, "struct") {
            let name = required_attr(&struct_node, "name")?;

            let mut fields = Vec::new();
            for member in elements(&struct_node, "member") {
                let member_name = required_attr(&member, "name")?;
                let type_desc = parse_member_type(&member, &types)?;
                if fields
                    .iter()
                    .any(|f: &FieldDescriptor| f.name == member_name)
                {
                    return Err(Error::Config(format!(
                        "duplicate member '{}' in struct '{}'",
                        member_name, name
                    )));
                }
                fields.push(FieldDescriptor::new(member_name, type_desc));
            }

            if types
                .insert(
                    name.clone(),
                    Arc::new(TypeDescriptor::struct_type(name.clone(), fields)),
                )
                .is_some()
            {
                return Err(Error::Config(format!("duplicate struct '{}'", name)));
            }
        }
    }

    Ok(types)
}

fn parse_member_type(
    member: &Node,
    types: &HashMap<String, Arc<TypeDescriptor>>,
) -> Result<Arc<TypeDescriptor>> {
    let type_attr = required_attr(member, "type")?;

    let base: Arc<TypeDescriptor> = if type_attr == "nonBasic" {
        let referenced = required_attr(member, "nonBasicTypeName")?;
        types
            .get(&referenced)
            .cloned()
            .ok_or_else(|| Error::Config(format!("unknown type '{}' referenced", referenced)))?
    } else {
        let kind = match type_attr.as_str() {
            "boolean" => PrimitiveKind::Bool,
            "octet" | "byte" | "uint8" => PrimitiveKind::U8,
            "char" | "char8" => PrimitiveKind::Char,
            "short" | "int16" => PrimitiveKind::I16,
            "unsignedShort" | "uint16" => PrimitiveKind::U16,
            "long" | "int32" => PrimitiveKind::I32,
            "unsignedLong" | "uint32" => PrimitiveKind::U32,
            "longLong" | "int64" => PrimitiveKind::I64,
            "unsignedLongLong" | "uint64" => PrimitiveKind::U64,
            "float" | "float32" => PrimitiveKind::F32,
            "double" | "float64" => PrimitiveKind::F64,
            "string" => PrimitiveKind::String {
                max_length: parse_bound(member, "stringMaxLength")?,
            },
            other => {
                return Err(Error::Config(format!("unsupported member type '{}'", other)));
            }
        };
        Arc::new(TypeDescriptor::primitive(type_attr.clone(), kind))
    };

    // A sequenceMaxLength attribute turns the member into a sequence of the
    // base type; -1 declares it unbounded.
    if member.attribute("sequenceMaxLength").is_some() {
        let max_length = parse_bound(member, "sequenceMaxLength")?;
        let name = format!("sequence<{}>", base.name);
        return Ok(Arc::new(TypeDescriptor::new(
            name,
            TypeKind::Sequence {
                element_type: base,
                max_length,
            },
        )));
    }

    Ok(base)
}

fn parse_bound(member: &Node, attr: &str) -> Result<Option<usize>> {
    match member.attribute(attr) {
        None => Ok(None),
        Some("-1") => Ok(None),
        Some(raw) => raw.parse::<usize>().map(Some).map_err(|_| {
            Error::Config(format!("invalid {} '{}'", attr, raw))
        }),
    }
}

fn parse_domain_libraries(
    root: &Node,
    types: &HashMap<String, Arc<TypeDescriptor>>,
) -> Result<HashMap<String, DomainConfig>> {
    let mut domains = HashMap::new();

    for library in elements(root, "domain_library") {
        let library_name = required_attr(&library, "name")?;

        for domain in elements(&library, "domain") {
            let domain_name = required_attr(&domain, "name")?;
            let domain_id = match domain.attribute("domain_id") {
                None => 0,
                Some(raw) => raw
                    .parse::<u32>()
                    .map_err(|_| Error::Config(format!("invalid domain_id '{}'", raw)))?,
            };

            let mut registered: HashMap<String, Arc<TypeDescriptor>> = HashMap::new();
            for reg in elements(&domain, "register_type") {
                let reg_name = required_attr(&reg, "name")?;
                let type_ref = required_attr(&reg, "type_ref")?;
                let desc = types.get(&type_ref).cloned().ok_or_else(|| {
                    Error::Config(format!("register_type references unknown type '{}'", type_ref))
                })?;
                registered.insert(reg_name, desc);
            }

            let mut topics = HashMap::new();
            for topic in elements(&domain, "topic") {
                let topic_name = required_attr(&topic, "name")?;
                let type_ref = required_attr(&topic, "register_type_ref")?;
                let desc = registered.get(&type_ref).cloned().ok_or_else(|| {
                    Error::Config(format!(
                        "topic '{}' references unregistered type '{}'",
                        topic_name, type_ref
                    ))
                })?;
                topics.insert(topic_name, (type_ref, desc));
            }

            domains.insert(
                format!("{}::{}", library_name, domain_name),
                DomainConfig { domain_id, topics },
            );
        }
    }

    Ok(domains)
}

fn parse_participant_libraries(
    root: &Node,
    domains: &HashMap<String, DomainConfig>,
) -> Result<HashMap<String, ParticipantConfig>> {
    let mut participants = HashMap::new();

    for library in elements(root, "domain_participant_library") {
        let library_name = required_attr(&library, "name")?;

        for participant in elements(&library, "domain_participant") {
            let participant_name = required_attr(&participant, "name")?;
            let selector = format!("{}::{}", library_name, participant_name);

            let domain_ref = required_attr(&participant, "domain_ref")?;
            let domain = domains.get(&domain_ref).ok_or_else(|| {
                Error::Config(format!(
                    "participant '{}' references unknown domain '{}'",
                    selector, domain_ref
                ))
            })?;

            let mut writers = Vec::new();
            for publisher in elements(&participant, "publisher") {
                let publisher_name = required_attr(&publisher, "name")?;
                for writer in elements(&publisher, "data_writer") {
                    writers.push(parse_endpoint(
                        &writer,
                        &publisher_name,
                        &selector,
                        domain,
                    )?);
                }
            }

            let mut readers = Vec::new();
            for subscriber in elements(&participant, "subscriber") {
                let subscriber_name = required_attr(&subscriber, "name")?;
                for reader in elements(&subscriber, "data_reader") {
                    readers.push(parse_endpoint(
                        &reader,
                        &subscriber_name,
                        &selector,
                        domain,
                    )?);
                }
            }

            check_unique_names(&selector, &writers, &readers)?;

            participants.insert(
                selector.clone(),
                ParticipantConfig {
                    name: selector,
                    domain_id: domain.domain_id,
                    writers,
                    readers,
                },
            );
        }
    }

    Ok(participants)
}

fn parse_endpoint(
    node: &Node,
    group_name: &str,
    participant: &str,
    domain: &DomainConfig,
) -> Result<EndpointConfig> {
    let entity_name = required_attr(node, "name")?;
    let topic_ref = required_attr(node, "topic_ref")?;
    let (type_name, type_desc) = domain.topics.get(&topic_ref).cloned().ok_or_else(|| {
        Error::Config(format!(
            "{} '{}' references unknown topic '{}'",
            node.tag_name().name(),
            entity_name,
            topic_ref
        ))
    })?;

    Ok(EndpointConfig {
        name: format!("{}::{}", group_name, entity_name),
        participant: participant.to_string(),
        topic: topic_ref,
        type_name,
        type_desc,
        domain_id: domain.domain_id,
    })
}

fn check_unique_names(
    participant: &str,
    writers: &[EndpointConfig],
    readers: &[EndpointConfig],
) -> Result<()> {
    let mut seen = HashMap::new();
    for endpoint in writers.iter().chain(readers) {
        if seen.insert(&endpoint.name, ()).is_some() {
            return Err(Error::Config(format!(
                "duplicate entity name '{}' in participant '{}'",
                endpoint.name, participant
            )));
        }
    }
    Ok(())
}
