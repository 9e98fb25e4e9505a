//! Fixtures shared by unit tests: five graph models, a small thesaurus and
//! two stored resources.

use anyhow::Result;
use fjall::{Config, Keyspace};
use serde_json::{Value as JsonValue, json};
use tempfile::{TempDir, tempdir};
use uuid::Uuid;

use crate::loader;
use crate::mapper::Mapper;
use crate::model::GraphModel;
use crate::store::Store;

pub(crate) const BASE_URL: &str = "http://localhost:8000";

const CRM: &str = "http://www.cidoc-crm.org/cidoc-crm/";

pub(crate) const NOTE_GRAPH: Uuid = Uuid::from_u128(0xbf734b4e_f6b5_11e9_8f09_a4d18cec433a);
pub(crate) const NOTE_NODE: Uuid = Uuid::from_u128(0xd3f4d9b8_f6b5_11e9_8f09_a4d18cec433a);

pub(crate) const OBJECT_GRAPH: Uuid = Uuid::from_u128(0xee72fb1e_fa6c_11e9_b369_3af9d3b32b71);
pub(crate) const GENERAL_USE: Uuid = Uuid::from_u128(0xee72fb1e_fa6c_11e9_b369_3af9d3b30101);
pub(crate) const GENERAL_USE_TYPE: Uuid = Uuid::from_u128(0xee72fb1e_fa6c_11e9_b369_3af9d3b30102);
pub(crate) const TIMESPAN: Uuid = Uuid::from_u128(0x127193ea_fa6d_11e9_b369_3af9d3b32b71);
pub(crate) const TIMESPAN_QUALIFIER: Uuid = Uuid::from_u128(0xee72fb1e_fa6c_11e9_b369_3af9d3b30104);
pub(crate) const TIMESPAN_BEGIN: Uuid = Uuid::from_u128(0xee72fb1e_fa6c_11e9_b369_3af9d3b30105);
pub(crate) const OBJECT_TYPE: Uuid = Uuid::from_u128(0xee72fb1e_fa6c_11e9_b369_3af9d3b30106);
pub(crate) const OBJECT_NOTE: Uuid = Uuid::from_u128(0xee72fb1e_fa6c_11e9_b369_3af9d3b30107);
pub(crate) const MATERIALS: Uuid = Uuid::from_u128(0xee72fb1e_fa6c_11e9_b369_3af9d3b30108);
pub(crate) const PARTS: Uuid = Uuid::from_u128(0xee72fb1e_fa6c_11e9_b369_3af9d3b30109);
pub(crate) const FEATURES: Uuid = Uuid::from_u128(0xee72fb1e_fa6c_11e9_b369_3af9d3b3010a);
pub(crate) const APPELLATION: Uuid = Uuid::from_u128(0xee72fb1e_fa6c_11e9_b369_3af9d3b3010b);

pub(crate) const PERSON_GRAPH: Uuid = Uuid::from_u128(0x92ccf5aa_bec9_11e9_bd39_0242ac160002);
pub(crate) const PERSON_REFERENCE: Uuid = Uuid::from_u128(0xaccb030c_bec9_11e9_b4dc_0242ac160002);
pub(crate) const PERSON_REFERENCE_TYPES: Uuid =
    Uuid::from_u128(0xaccb030c_bec9_11e9_b4dc_0242ac160003);

pub(crate) const BRANCH_GRAPH: Uuid = Uuid::from_u128(0x40dbcffa_faa1_11e9_84de_3af9d3b32b71);
pub(crate) const BRANCH_REFERENCE: Uuid = Uuid::from_u128(0x51c3ede8_faa1_11e9_84de_3af9d3b32b71);
pub(crate) const BRANCH_CARRIERS: Uuid = Uuid::from_u128(0x51c3ede8_faa1_11e9_84de_3af9d3b32b72);

pub(crate) const COLLECTION_GRAPH: Uuid = Uuid::from_u128(0x09e3dc8a_c055_11e9_b4dc_0242ac160002);
pub(crate) const COLLECTION_TYPE: Uuid = Uuid::from_u128(0x09e3dc8a_c055_11e9_b4dc_0242ac160003);

pub(crate) const MATERIALS_COLLECTION: Uuid =
    Uuid::from_u128(0x5a3f2c10_0e47_4d0c_9d4b_6a1c2b9f0001);
pub(crate) const PAINTINGS_COLLECTION: Uuid =
    Uuid::from_u128(0x5a3f2c10_0e47_4d0c_9d4b_6a1c2b9f0002);
pub(crate) const TECHNIQUES_COLLECTION: Uuid =
    Uuid::from_u128(0x5a3f2c10_0e47_4d0c_9d4b_6a1c2b9f0003);

pub(crate) const AQUARELLE_URI: &str = "http://vocab.getty.edu/aat/300404216";
pub(crate) const AQUARELLE_PAINTING: Uuid = Uuid::from_u128(0x7d4e9a01_3b6c_4f0e_8a52_1c9e0b7d0001);
pub(crate) const AQUARELLE_TECHNIQUE: Uuid =
    Uuid::from_u128(0x7d4e9a01_3b6c_4f0e_8a52_1c9e0b7d0002);
pub(crate) const PAINTINGS: Uuid = Uuid::from_u128(0x7d4e9a01_3b6c_4f0e_8a52_1c9e0b7d0003);

pub(crate) const FEATURE_A: Uuid = Uuid::from_u128(0x12bbf5bc_fa85_11e9_91b8_3af9d3b32b71);
pub(crate) const FEATURE_B: Uuid = Uuid::from_u128(0x24d0d25a_fa75_11e9_b369_3af9d3b32b71);

fn crm(local: &str) -> String {
    format!("{CRM}{local}")
}

fn top(id: Uuid, name: &str, class: &str) -> JsonValue {
    json!({
        "nodeid": id,
        "name": name,
        "datatype": "semantic",
        "ontologyclass": crm(class),
        "istopnode": true
    })
}

fn node(id: Uuid, name: &str, datatype: &str, class: &str, group: Uuid) -> JsonValue {
    json!({
        "nodeid": id,
        "name": name,
        "datatype": datatype,
        "ontologyclass": crm(class),
        "nodegroup_id": group,
        "istopnode": false
    })
}

fn edge(domain: Uuid, range: Uuid, property: &str) -> JsonValue {
    json!({
        "domainnode_id": domain,
        "rangenode_id": range,
        "ontologyproperty": crm(property)
    })
}

fn group(id: Uuid, cardinality: &str, parent: Option<Uuid>) -> JsonValue {
    json!({ "nodegroupid": id, "cardinality": cardinality, "parentnodegroup_id": parent })
}

pub(crate) fn note_graph_json() -> JsonValue {
    json!({
        "graphid": NOTE_GRAPH,
        "name": "Basic Object",
        "slug": "basic-object",
        "nodes": [
            top(NOTE_GRAPH, "Object", "E22_Man-Made_Object"),
            node(NOTE_NODE, "Note", "string", "E62_String", NOTE_NODE),
        ],
        "edges": [edge(NOTE_GRAPH, NOTE_NODE, "P3_has_note")],
        "nodegroups": [group(NOTE_NODE, "1", None)]
    })
}

pub(crate) fn object_graph_json() -> JsonValue {
    let mut materials = node(MATERIALS, "Materials", "concept-list", "E57_Material", MATERIALS);
    materials["config"] = json!({ "rdmCollection": MATERIALS_COLLECTION });
    json!({
        "graphid": OBJECT_GRAPH,
        "name": "Complex Object",
        "slug": "complex-object",
        "nodes": [
            top(OBJECT_GRAPH, "Object", "E22_Man-Made_Object"),
            node(GENERAL_USE, "General Use", "concept", "E55_Type", GENERAL_USE),
            node(GENERAL_USE_TYPE, "General Use Type", "concept", "E55_Type", GENERAL_USE),
            node(TIMESPAN, "Timespan", "semantic", "E52_Time-Span", TIMESPAN),
            node(TIMESPAN_QUALIFIER, "Qualifier", "string", "E62_String", TIMESPAN),
            node(TIMESPAN_BEGIN, "Begin of the begin", "date", "E61_Time_Primitive", TIMESPAN),
            node(OBJECT_TYPE, "Type", "concept", "E55_Type", OBJECT_TYPE),
            node(OBJECT_NOTE, "Note", "string", "E62_String", OBJECT_NOTE),
            materials,
            node(PARTS, "Number of parts", "number", "E60_Number", PARTS),
            node(
                FEATURES,
                "Shows features of",
                "resource-instance-list",
                "E22_Man-Made_Object",
                FEATURES
            ),
            node(APPELLATION, "Appellation", "string", "E41_Appellation", APPELLATION),
        ],
        "edges": [
            edge(OBJECT_GRAPH, GENERAL_USE, "P101_had_as_general_use"),
            edge(GENERAL_USE, GENERAL_USE_TYPE, "P2_has_type"),
            edge(OBJECT_GRAPH, TIMESPAN, "P160_has_temporal_projection"),
            edge(TIMESPAN, TIMESPAN_QUALIFIER, "P79_beginning_is_qualified_by"),
            edge(TIMESPAN, TIMESPAN_BEGIN, "P82a_begin_of_the_begin"),
            edge(OBJECT_GRAPH, OBJECT_TYPE, "P2_has_type"),
            edge(OBJECT_GRAPH, OBJECT_NOTE, "P3_has_note"),
            edge(OBJECT_GRAPH, MATERIALS, "P45_consists_of"),
            edge(OBJECT_GRAPH, PARTS, "P57_has_number_of_parts"),
            edge(OBJECT_GRAPH, FEATURES, "P130_shows_features_of"),
            edge(OBJECT_GRAPH, APPELLATION, "P1_is_identified_by"),
        ],
        "nodegroups": [
            group(GENERAL_USE, "1", None),
            group(TIMESPAN, "1", None),
            group(OBJECT_TYPE, "1", None),
            group(OBJECT_NOTE, "1", None),
            group(MATERIALS, "1", None),
            group(PARTS, "1", None),
            group(FEATURES, "1", None),
            group(APPELLATION, "n", None),
        ]
    })
}

pub(crate) fn person_graph_json() -> JsonValue {
    json!({
        "graphid": PERSON_GRAPH,
        "name": "Person",
        "nodes": [
            top(PERSON_GRAPH, "Person", "E21_Person"),
            node(
                PERSON_REFERENCE,
                "Referred to by",
                "semantic",
                "E33_Linguistic_Object",
                PERSON_REFERENCE
            ),
            node(
                PERSON_REFERENCE_TYPES,
                "Reference types",
                "concept-list",
                "E55_Type",
                PERSON_REFERENCE
            ),
        ],
        "edges": [
            edge(PERSON_GRAPH, PERSON_REFERENCE, "P67i_is_referred_to_by"),
            edge(PERSON_REFERENCE, PERSON_REFERENCE_TYPES, "P2_has_type"),
        ],
        "nodegroups": [group(PERSON_REFERENCE, "n", None)]
    })
}

pub(crate) fn branch_graph_json() -> JsonValue {
    json!({
        "graphid": BRANCH_GRAPH,
        "name": "Object with carried text",
        "slug": "5098_b_resinst",
        "nodes": [
            top(BRANCH_GRAPH, "Object", "E22_Man-Made_Object"),
            node(
                BRANCH_REFERENCE,
                "Referred to by",
                "semantic",
                "E33_Linguistic_Object",
                BRANCH_REFERENCE
            ),
            node(
                BRANCH_CARRIERS,
                "Carried by",
                "resource-instance-list",
                "E22_Man-Made_Object",
                BRANCH_REFERENCE
            ),
        ],
        "edges": [
            edge(BRANCH_GRAPH, BRANCH_REFERENCE, "P67i_is_referred_to_by"),
            edge(BRANCH_REFERENCE, BRANCH_CARRIERS, "P128i_is_carried_by"),
        ],
        "nodegroups": [group(BRANCH_REFERENCE, "1", None)]
    })
}

pub(crate) fn collection_graph_json() -> JsonValue {
    let mut kind = node(COLLECTION_TYPE, "Type", "concept", "E55_Type", COLLECTION_TYPE);
    kind["config"] = json!({ "rdmCollection": PAINTINGS_COLLECTION });
    json!({
        "graphid": COLLECTION_GRAPH,
        "name": "Collection ambiguity",
        "nodes": [top(COLLECTION_GRAPH, "Object", "E22_Man-Made_Object"), kind],
        "edges": [edge(COLLECTION_GRAPH, COLLECTION_TYPE, "P2_has_type")],
        "nodegroups": [group(COLLECTION_TYPE, "1", None)]
    })
}

pub(crate) fn note_graph() -> GraphModel {
    serde_json::from_value(note_graph_json()).expect("note graph fixture")
}

pub(crate) fn graphs_json() -> JsonValue {
    json!({
        "graph": [
            note_graph_json(),
            object_graph_json(),
            person_graph_json(),
            branch_graph_json(),
            collection_graph_json(),
        ]
    })
}

fn concept(id: &str, label: &str, narrower: &[Uuid]) -> JsonValue {
    json!({
        "id": id,
        "scheme": "3b5c9ac7-5615-3de6-9e2d-4cd7ef7460e4",
        "prefLabels": { "en": label },
        "narrower": narrower
    })
}

pub(crate) fn thesaurus_json() -> JsonValue {
    json!({
        "schemes": [
            {
                "id": "3b5c9ac7-5615-3de6-9e2d-4cd7ef7460e4",
                "uri": "http://localhost:8000/schemes/test",
                "prefLabels": { "en": "Test Thesaurus" }
            }
        ],
        "concepts": [
            concept(
                "fb457e76-e018-41e7-9be3-0f986816450a",
                "Test Type A",
                &[Uuid::from_u128(0x14c92c17_5e2f_413a_95c2_3c5e41ee87d2)]
            ),
            concept("14c92c17-5e2f-413a-95c2-3c5e41ee87d2", "Meta Type A", &[]),
            concept("6bac5802-a6f8-427c-ba5f-d4b30d5b070e", "Single Type A", &[]),
            concept("9b61c995-71d8-4bce-987b-0ffa3da4c71c", "material b", &[]),
            concept("36c8d7a3-32e7-49e4-bd4c-2169a06b240a", "material a", &[]),
            concept("c3c4b8a8-39bb-41e7-af45-3a0c60fa4ddf", "Concept 2", &[]),
            concept("0bb450bc-8fe3-46cb-968e-2b56849e6e96", "Concept 1", &[]),
            concept(&PAINTINGS.to_string(), "paintings (visual works)", &[AQUARELLE_PAINTING]),
            {
                "id": AQUARELLE_PAINTING,
                "uri": AQUARELLE_URI,
                "prefLabels": { "en": "aquarelles (paintings)", "fr": "aquarelles" }
            },
            {
                "id": AQUARELLE_TECHNIQUE,
                "uri": AQUARELLE_URI,
                "prefLabels": { "en": "aquarelle (technique)" }
            }
        ],
        "collections": [
            {
                "id": MATERIALS_COLLECTION,
                "label": "Materials",
                "members": [
                    "9b61c995-71d8-4bce-987b-0ffa3da4c71c",
                    "36c8d7a3-32e7-49e4-bd4c-2169a06b240a"
                ]
            },
            { "id": PAINTINGS_COLLECTION, "label": "Paintings", "members": [PAINTINGS] },
            { "id": TECHNIQUES_COLLECTION, "label": "Techniques", "members": [AQUARELLE_TECHNIQUE] }
        ]
    })
}

fn feature(id: Uuid, note: &str) -> JsonValue {
    json!({
        "resourceinstance": {
            "resourceinstanceid": id,
            "graph_id": OBJECT_GRAPH,
            "legacyid": id
        },
        "tiles": [
            {
                "tileid": Uuid::from_u128(id.as_u128() ^ 1),
                "resourceinstance_id": id,
                "nodegroup_id": OBJECT_NOTE,
                "parenttile_id": null,
                "data": { OBJECT_NOTE.to_string(): note }
            }
        ]
    })
}

pub(crate) fn business_data_json() -> JsonValue {
    json!({
        "business_data": {
            "resources": [
                feature(FEATURE_A, "first feature"),
                feature(FEATURE_B, "second feature"),
            ]
        }
    })
}

pub(crate) fn open_store() -> Result<(TempDir, Store)> {
    let tmp_dir = tempdir()?;
    let keyspace = Keyspace::open(Config::new(tmp_dir.path()).temporary(true))?;
    let store = Store::open(keyspace)?;
    Ok((tmp_dir, store))
}

pub(crate) fn load_thesaurus(store: &Store) -> Result<()> {
    loader::load_thesaurus(&store.concepts, &thesaurus_json())?;
    Ok(())
}

/// Graphs, thesaurus and the two feature resources.
pub(crate) fn seeded_mapper() -> Result<(TempDir, Mapper)> {
    let (tmp_dir, store) = open_store()?;
    loader::load_graphs(&store.graphs, &graphs_json())?;
    load_thesaurus(&store)?;
    loader::load_business_data(&store, &business_data_json())?;
    Ok((tmp_dir, Mapper::new(store, BASE_URL, "en")))
}
