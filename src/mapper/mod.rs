//! Bidirectional mapping between JSON-LD documents and the tile tree of
//! one resource instance, guided by a graph schema and the concept store.

mod export;
mod import;
mod resolve;

use serde_json::Value as JsonValue;
use tracing::info;
use uuid::Uuid;

use self::export::Exporter;
use self::import::Importer;
use crate::error::{MapperError, MapperResult};
use crate::json_ld::vocab::ID;
use crate::json_ld::{IriMinter, expand_document};
use crate::model::{GraphSchema, ResourceInstance};
use crate::store::Store;

#[derive(Clone)]
pub(crate) struct Mapper {
    store: Store,
    iris: IriMinter,
    /// Preferred language of exported concept labels
    language: String,
}

impl Mapper {
    pub(crate) fn new(store: Store, base_url: &str, language: &str) -> Mapper {
        Mapper {
            store,
            iris: IriMinter::new(base_url),
            language: language.to_string(),
        }
    }

    pub(crate) fn store(&self) -> &Store {
        &self.store
    }

    pub(crate) fn iris(&self) -> &IriMinter {
        &self.iris
    }

    /// Replaces resource `resource_id` with the content of `document` and
    /// returns its export. Nothing is written when mapping fails.
    pub(crate) fn import(
        &self,
        schema: &GraphSchema,
        resource_id: Uuid,
        document: &JsonValue,
    ) -> MapperResult<JsonValue> {
        let expanded = expand(document)?;
        self.import_expanded(schema, resource_id, &expanded)
    }

    /// Imports under a freshly minted resource id, ignoring the document's
    /// own `@id`.
    pub(crate) fn create(
        &self,
        schema: &GraphSchema,
        document: &JsonValue,
    ) -> MapperResult<(Uuid, JsonValue)> {
        let resource_id = Uuid::now_v7();
        let mut expanded = expand(document)?;
        if let JsonValue::Object(map) = &mut expanded {
            map.insert(ID.as_str().to_string(), self.iris.resource(resource_id).into());
        }
        let exported = self.import_expanded(schema, resource_id, &expanded)?;
        Ok((resource_id, exported))
    }

    fn import_expanded(
        &self,
        schema: &GraphSchema,
        resource_id: Uuid,
        expanded: &JsonValue,
    ) -> MapperResult<JsonValue> {
        let _guard = self.store.resources.lock(resource_id);
        let resource = match self.store.resources.find(resource_id)? {
            Some(existing) if existing.graph_id != schema.graphid() => {
                return Err(MapperError::SchemaMismatch(format!(
                    "resource {resource_id} belongs to graph {}",
                    existing.graph_id
                )));
            }
            Some(existing) => existing,
            None => ResourceInstance::new(resource_id, schema.graphid()),
        };
        let tiles = Importer::new(self, schema, resource_id).build(expanded)?;
        self.store.resources.replace(&resource, &tiles)?;
        info!(
            target: "mapper",
            resource = %resource_id,
            graph = %schema.graphid(),
            tiles = tiles.len(),
            "resource imported"
        );
        Exporter::new(self, schema, resource_id, &tiles).document()
    }

    pub(crate) fn export(&self, resource_id: Uuid) -> MapperResult<JsonValue> {
        let resource = self
            .store
            .resources
            .find(resource_id)?
            .ok_or(MapperError::ResourceNotFound(resource_id))?;
        let schema = self.store.graphs.find(resource.graph_id)?;
        let tiles = self.store.resources.tiles(resource_id)?;
        Exporter::new(self, &schema, resource_id, &tiles).document()
    }
}

/// Unwraps a single-element top level array and expands the inline context.
fn expand(document: &JsonValue) -> MapperResult<JsonValue> {
    let document = match document {
        JsonValue::Array(items) if items.len() == 1 => &items[0],
        JsonValue::Array(items) => {
            return Err(MapperError::SchemaMismatch(format!(
                "expected a single resource document, found {} entries",
                items.len()
            )));
        }
        other => other,
    };
    expand_document(document).map_err(|err| MapperError::SchemaMismatch(format!("{err:#}")))
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use serde_json::{Value as JsonValue, json};
    use uuid::Uuid;

    use super::Mapper;
    use crate::error::{MapperError, MapperResult};
    use crate::json_ld::LocalIri;
    use crate::json_ld::vocab::{XSD_DATE_TIME, XSD_INTEGER};
    use crate::model::{ResourceInstance, Tile, TileValue};
    use crate::testing::{
        self, APPELLATION, AQUARELLE_PAINTING, AQUARELLE_URI, BRANCH_CARRIERS, BRANCH_GRAPH,
        BRANCH_REFERENCE, COLLECTION_GRAPH, COLLECTION_TYPE, FEATURE_A, FEATURE_B, FEATURES,
        MATERIALS, NOTE_GRAPH, NOTE_NODE, OBJECT_GRAPH, OBJECT_TYPE, PERSON_GRAPH,
        PERSON_REFERENCE, PERSON_REFERENCE_TYPES, TIMESPAN,
    };

    const CRM: &str = "http://www.cidoc-crm.org/cidoc-crm/";
    const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";

    const TEST_TYPE_A: Uuid = Uuid::from_u128(0xfb457e76_e018_41e7_9be3_0f986816450a);
    const META_TYPE_A: Uuid = Uuid::from_u128(0x14c92c17_5e2f_413a_95c2_3c5e41ee87d2);
    const SINGLE_TYPE_A: Uuid = Uuid::from_u128(0x6bac5802_a6f8_427c_ba5f_d4b30d5b070e);
    const MATERIAL_B: Uuid = Uuid::from_u128(0x9b61c995_71d8_4bce_987b_0ffa3da4c71c);
    const MATERIAL_A: Uuid = Uuid::from_u128(0x36c8d7a3_32e7_49e4_bd4c_2169a06b240a);
    const CONCEPT_2: Uuid = Uuid::from_u128(0xc3c4b8a8_39bb_41e7_af45_3a0c60fa4ddf);
    const CONCEPT_1: Uuid = Uuid::from_u128(0x0bb450bc_8fe3_46cb_968e_2b56849e6e96);

    fn crm(local: &str) -> String {
        format!("{CRM}{local}")
    }

    fn get<'a>(value: &'a JsonValue, local: &str) -> &'a JsonValue {
        &value[crm(local).as_str()]
    }

    fn import(mapper: &Mapper, graph: Uuid, id: Uuid, doc: &JsonValue) -> MapperResult<JsonValue> {
        let schema = mapper.store().graphs.find(graph)?;
        mapper.import(&schema, id, doc)
    }

    fn concept(mapper: &Mapper, id: Uuid, class: &str) -> JsonValue {
        json!({ "@id": mapper.iris().concept(id), "@type": crm(class) })
    }

    fn feature(mapper: &Mapper, id: Uuid) -> JsonValue {
        json!({ "@id": mapper.iris().resource(id), "@type": crm("E22_Man-Made_Object") })
    }

    fn note(mapper: &Mapper, id: Uuid, text: &str) -> JsonValue {
        json!({
            "@id": mapper.iris().resource(id),
            "@type": crm("E22_Man-Made_Object"),
            crm("P3_has_note"): text
        })
    }

    fn complex_document(mapper: &Mapper, id: Uuid) -> JsonValue {
        let mut general_use = concept(mapper, TEST_TYPE_A, "E55_Type");
        general_use[crm("P2_has_type")] = concept(mapper, META_TYPE_A, "E55_Type");
        json!({
            "@id": mapper.iris().resource(id),
            "@type": crm("E22_Man-Made_Object"),
            crm("P101_had_as_general_use"): general_use,
            crm("P160_has_temporal_projection"): {
                "@type": crm("E52_Time-Span"),
                crm("P79_beginning_is_qualified_by"): "example",
                crm("P82a_begin_of_the_begin"): {
                    "@type": XSD_DATE_TIME.as_str(),
                    "@value": "2019-10-01"
                }
            },
            crm("P2_has_type"): concept(mapper, SINGLE_TYPE_A, "E55_Type"),
            crm("P3_has_note"): "test note",
            crm("P45_consists_of"): [
                concept(mapper, MATERIAL_B, "E57_Material"),
                concept(mapper, MATERIAL_A, "E57_Material")
            ],
            crm("P57_has_number_of_parts"): 5,
            crm("P130_shows_features_of"): [feature(mapper, FEATURE_A), feature(mapper, FEATURE_B)]
        })
    }

    #[test]
    fn import_basic_note() -> Result<()> {
        let (_tmp_dir, mapper) = testing::seeded_mapper()?;
        let id = Uuid::parse_str("221d1154-fa8e-11e9-9cbb-3af9d3b32b71")?;
        let doc = note(&mapper, id, "test!");

        let exported = import(&mapper, NOTE_GRAPH, id, &doc)?;
        assert_eq!(exported, doc);

        let tiles = mapper.store().resources.tiles(id)?;
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].nodegroup_id, NOTE_NODE);
        assert_eq!(
            tiles[0].data.get(&NOTE_NODE),
            Some(&TileValue::String {
                value: "test!".to_string(),
                language: None
            })
        );
        assert_eq!(mapper.export(id)?, doc);
        Ok(())
    }

    #[test]
    fn import_complex_object() -> Result<()> {
        let (_tmp_dir, mapper) = testing::seeded_mapper()?;
        let id = Uuid::parse_str("12345678-abcd-11e9-9cbb-3af9d3b32b71")?;
        let exported = import(&mapper, OBJECT_GRAPH, id, &complex_document(&mapper, id))?;

        assert_eq!(
            *get(&exported, "P101_had_as_general_use"),
            json!({
                "@id": mapper.iris().concept(TEST_TYPE_A),
                "@type": crm("E55_Type"),
                RDFS_LABEL: "Test Type A",
                crm("P2_has_type"): {
                    "@id": mapper.iris().concept(META_TYPE_A),
                    "@type": crm("E55_Type"),
                    RDFS_LABEL: "Meta Type A"
                }
            })
        );
        assert_eq!(
            get(&exported, "P2_has_type")[RDFS_LABEL],
            json!("Single Type A")
        );
        assert_eq!(*get(&exported, "P3_has_note"), json!("test note"));
        assert_eq!(*get(&exported, "P57_has_number_of_parts"), json!(5));

        let timespan = get(&exported, "P160_has_temporal_projection");
        let timespan_iri = timespan["@id"].as_str().unwrap();
        assert!(matches!(
            mapper.iris().parse(timespan_iri),
            Some(LocalIri::TileNode { node, .. }) if node == TIMESPAN
        ));
        assert_eq!(*get(timespan, "P79_beginning_is_qualified_by"), json!("example"));
        assert_eq!(
            *get(timespan, "P82a_begin_of_the_begin"),
            json!({ "@type": XSD_DATE_TIME.as_str(), "@value": "2019-10-01" })
        );

        let labels: Vec<&str> = get(&exported, "P45_consists_of")
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m[RDFS_LABEL].as_str().unwrap())
            .collect();
        assert_eq!(labels, vec!["material b", "material a"]);
        assert_eq!(
            *get(&exported, "P130_shows_features_of"),
            json!([feature(&mapper, FEATURE_A), feature(&mapper, FEATURE_B)])
        );

        let tiles = mapper.store().resources.tiles(id)?;
        assert_eq!(tiles.len(), 7);
        let materials = tiles.iter().find(|t| t.nodegroup_id == MATERIALS).unwrap();
        assert_eq!(
            materials.data.get(&MATERIALS),
            Some(&TileValue::ConceptList(vec![MATERIAL_B, MATERIAL_A]))
        );
        Ok(())
    }

    #[test]
    fn export_is_a_fixed_point() -> Result<()> {
        let (_tmp_dir, mapper) = testing::seeded_mapper()?;
        let id = Uuid::now_v7();
        let first = import(&mapper, OBJECT_GRAPH, id, &complex_document(&mapper, id))?;
        let tiles = mapper.store().resources.tiles(id)?;

        let second = import(&mapper, OBJECT_GRAPH, id, &first)?;
        assert_eq!(second, first);
        assert_eq!(mapper.export(id)?, first);

        let timespan_tile = |tiles: &[Tile]| {
            tiles
                .iter()
                .find(|t| t.nodegroup_id == TIMESPAN)
                .map(|t| t.tileid)
        };
        assert_eq!(
            timespan_tile(&mapper.store().resources.tiles(id)?),
            timespan_tile(&tiles)
        );
        Ok(())
    }

    #[test]
    fn concept_list_inside_semantic_branch() -> Result<()> {
        let (_tmp_dir, mapper) = testing::seeded_mapper()?;
        let id = Uuid::now_v7();
        let doc = json!({
            "@id": mapper.iris().resource(id),
            "@type": crm("E21_Person"),
            crm("P67i_is_referred_to_by"): {
                "@type": crm("E33_Linguistic_Object"),
                crm("P2_has_type"): [
                    concept(&mapper, CONCEPT_2, "E55_Type"),
                    concept(&mapper, CONCEPT_1, "E55_Type")
                ]
            }
        });

        let exported = import(&mapper, PERSON_GRAPH, id, &doc)?;
        let reference = get(&exported, "P67i_is_referred_to_by");
        assert_eq!(reference["@type"], json!(crm("E33_Linguistic_Object")));
        let labels: Vec<&str> = get(reference, "P2_has_type")
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c[RDFS_LABEL].as_str().unwrap())
            .collect();
        assert_eq!(labels, vec!["Concept 2", "Concept 1"]);

        let tiles = mapper.store().resources.tiles(id)?;
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].nodegroup_id, PERSON_REFERENCE);
        assert_eq!(
            tiles[0].data.get(&PERSON_REFERENCE_TYPES),
            Some(&TileValue::ConceptList(vec![CONCEPT_2, CONCEPT_1]))
        );
        Ok(())
    }

    #[test]
    fn resource_instance_list() -> Result<()> {
        let (_tmp_dir, mapper) = testing::seeded_mapper()?;
        let id = Uuid::now_v7();
        let doc = json!({
            "@id": mapper.iris().resource(id),
            "@type": crm("E22_Man-Made_Object"),
            crm("P130_shows_features_of"): [
                feature(&mapper, FEATURE_A),
                feature(&mapper, FEATURE_B),
                feature(&mapper, id)
            ]
        });

        let exported = import(&mapper, OBJECT_GRAPH, id, &doc)?;
        assert_eq!(exported, doc);
        let tiles = mapper.store().resources.tiles(id)?;
        assert_eq!(
            tiles[0].data.get(&FEATURES),
            Some(&TileValue::ResourceInstanceList(vec![FEATURE_A, FEATURE_B, id]))
        );
        Ok(())
    }

    #[test]
    fn resource_instance_list_inside_branch() -> Result<()> {
        let (_tmp_dir, mapper) = testing::seeded_mapper()?;
        let id = Uuid::now_v7();
        let doc = json!({
            "@id": mapper.iris().resource(id),
            "@type": crm("E22_Man-Made_Object"),
            crm("P67i_is_referred_to_by"): {
                "@type": crm("E33_Linguistic_Object"),
                crm("P128i_is_carried_by"): [
                    feature(&mapper, FEATURE_A),
                    feature(&mapper, FEATURE_B)
                ]
            }
        });

        let exported = import(&mapper, BRANCH_GRAPH, id, &doc)?;
        let reference = get(&exported, "P67i_is_referred_to_by");
        assert_eq!(
            *get(reference, "P128i_is_carried_by"),
            json!([feature(&mapper, FEATURE_A), feature(&mapper, FEATURE_B)])
        );
        let tiles = mapper.store().resources.tiles(id)?;
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].nodegroup_id, BRANCH_REFERENCE);
        assert_eq!(
            tiles[0].data.get(&BRANCH_CARRIERS),
            Some(&TileValue::ResourceInstanceList(vec![FEATURE_A, FEATURE_B]))
        );
        Ok(())
    }

    #[test]
    fn collection_disambiguates_shared_uri() -> Result<()> {
        let (_tmp_dir, mapper) = testing::seeded_mapper()?;
        let id = Uuid::now_v7();
        let doc = json!({
            "@id": mapper.iris().resource(id),
            "@type": crm("E22_Man-Made_Object"),
            crm("P2_has_type"): { "@id": AQUARELLE_URI, "@type": crm("E55_Type") }
        });

        let exported = import(&mapper, COLLECTION_GRAPH, id, &doc)?;
        assert_eq!(
            *get(&exported, "P2_has_type"),
            json!({
                "@id": mapper.iris().concept(AQUARELLE_PAINTING),
                "@type": crm("E55_Type"),
                RDFS_LABEL: "aquarelles (paintings)"
            })
        );
        let tiles = mapper.store().resources.tiles(id)?;
        assert_eq!(
            tiles[0].data.get(&COLLECTION_TYPE),
            Some(&TileValue::Concept(AQUARELLE_PAINTING))
        );
        Ok(())
    }

    #[test]
    fn shared_uri_without_collection_is_ambiguous() -> Result<()> {
        let (_tmp_dir, mapper) = testing::seeded_mapper()?;
        let id = Uuid::now_v7();
        let doc = json!({
            "@id": mapper.iris().resource(id),
            "@type": crm("E21_Person"),
            crm("P67i_is_referred_to_by"): {
                "@type": crm("E33_Linguistic_Object"),
                crm("P2_has_type"): [{ "@id": AQUARELLE_URI, "@type": crm("E55_Type") }]
            }
        });
        assert!(matches!(
            import(&mapper, PERSON_GRAPH, id, &doc),
            Err(MapperError::UnresolvedReference(_))
        ));
        Ok(())
    }

    #[test]
    fn concept_outside_collection() -> Result<()> {
        let (_tmp_dir, mapper) = testing::seeded_mapper()?;
        let id = Uuid::now_v7();
        let doc = json!({
            "@id": mapper.iris().resource(id),
            "@type": crm("E22_Man-Made_Object"),
            crm("P45_consists_of"): [{ "@id": AQUARELLE_URI, "@type": crm("E57_Material") }]
        });
        assert!(matches!(
            import(&mapper, OBJECT_GRAPH, id, &doc),
            Err(MapperError::ConceptNotInCollection { uri, .. }) if uri == AQUARELLE_URI
        ));
        Ok(())
    }

    #[test]
    fn reject_documents_not_matching_the_graph() -> Result<()> {
        let (_tmp_dir, mapper) = testing::seeded_mapper()?;
        let id = Uuid::now_v7();

        let other_id = note(&mapper, Uuid::now_v7(), "x");
        let mut wrong_type = note(&mapper, id, "x");
        wrong_type["@type"] = json!(crm("E21_Person"));
        let mut unknown_predicate = note(&mapper, id, "x");
        unknown_predicate[crm("P999_unknown")] = json!("x");
        let mut no_id = note(&mapper, id, "x");
        no_id.as_object_mut().unwrap().remove("@id");

        for doc in [other_id, wrong_type, unknown_predicate, no_id] {
            assert!(matches!(
                import(&mapper, NOTE_GRAPH, id, &doc),
                Err(MapperError::SchemaMismatch(_))
            ));
        }
        assert!(!mapper.store().resources.exists(id)?);
        Ok(())
    }

    #[test]
    fn reject_array_for_single_valued_node() -> Result<()> {
        let (_tmp_dir, mapper) = testing::seeded_mapper()?;
        let id = Uuid::now_v7();
        let mut doc = note(&mapper, id, "x");
        doc[crm("P3_has_note")] = json!(["one", "two"]);
        assert!(matches!(
            import(&mapper, OBJECT_GRAPH, id, &doc),
            Err(MapperError::CardinalityViolation(_))
        ));
        doc[crm("P3_has_note")] = json!(["one"]);
        assert!(matches!(
            import(&mapper, OBJECT_GRAPH, id, &doc),
            Err(MapperError::CardinalityViolation(_))
        ));
        Ok(())
    }

    #[test]
    fn reject_dangling_references() -> Result<()> {
        let (_tmp_dir, mapper) = testing::seeded_mapper()?;
        let id = Uuid::now_v7();
        let base = json!({
            "@id": mapper.iris().resource(id),
            "@type": crm("E22_Man-Made_Object")
        });

        let mut unknown_concept = base.clone();
        unknown_concept[crm("P2_has_type")] = concept(&mapper, Uuid::now_v7(), "E55_Type");
        let mut foreign_concept = base.clone();
        foreign_concept[crm("P2_has_type")] =
            json!({ "@id": "http://vocab.getty.edu/aat/0", "@type": crm("E55_Type") });
        let mut missing_resource = base.clone();
        missing_resource[crm("P130_shows_features_of")] = json!([feature(&mapper, Uuid::now_v7())]);

        for doc in [unknown_concept, foreign_concept, missing_resource] {
            assert!(matches!(
                import(&mapper, OBJECT_GRAPH, id, &doc),
                Err(MapperError::UnresolvedReference(_))
            ));
        }
        Ok(())
    }

    #[test]
    fn only_base_url_iris_are_local() -> Result<()> {
        let (_tmp_dir, mapper) = testing::seeded_mapper()?;
        let id = Uuid::now_v7();
        let mut foreign_host = note(&mapper, id, "x");
        foreign_host["@id"] = json!(format!("http://other-host.example/resources/{id}"));
        assert!(matches!(
            import(&mapper, NOTE_GRAPH, id, &foreign_host),
            Err(MapperError::SchemaMismatch(_))
        ));

        let concept_id = Uuid::now_v7();
        let uri = format!("http://other-arches.example/concepts/{}", Uuid::now_v7());
        crate::loader::load_thesaurus(
            &mapper.store().concepts,
            &json!({
                "concepts": [{ "id": concept_id, "uri": uri, "prefLabels": { "en": "remote" } }]
            }),
        )?;
        let doc = json!({
            "@id": mapper.iris().resource(id),
            "@type": crm("E22_Man-Made_Object"),
            crm("P2_has_type"): { "@id": uri, "@type": crm("E55_Type") }
        });
        import(&mapper, OBJECT_GRAPH, id, &doc)?;
        let tiles = mapper.store().resources.tiles(id)?;
        assert_eq!(
            tiles[0].data.get(&OBJECT_TYPE),
            Some(&TileValue::Concept(concept_id))
        );
        Ok(())
    }

    #[test]
    fn reject_uncoercible_literals() -> Result<()> {
        let (_tmp_dir, mapper) = testing::seeded_mapper()?;
        let id = Uuid::now_v7();
        let base = json!({
            "@id": mapper.iris().resource(id),
            "@type": crm("E22_Man-Made_Object")
        });

        let mut bad_date = base.clone();
        bad_date[crm("P160_has_temporal_projection")] = json!({
            "@type": crm("E52_Time-Span"),
            crm("P82a_begin_of_the_begin"): {
                "@type": XSD_DATE_TIME.as_str(),
                "@value": "not a date"
            }
        });
        let mut bad_number = base.clone();
        bad_number[crm("P57_has_number_of_parts")] = json!("five");
        let mut fractional_integer = base.clone();
        fractional_integer[crm("P57_has_number_of_parts")] =
            json!({ "@type": XSD_INTEGER.as_str(), "@value": "2.5" });

        for doc in [bad_date, bad_number, fractional_integer] {
            assert!(matches!(
                import(&mapper, OBJECT_GRAPH, id, &doc),
                Err(MapperError::TypeCoercion(_))
            ));
        }
        Ok(())
    }

    #[test]
    fn failed_import_keeps_previous_state() -> Result<()> {
        let (_tmp_dir, mapper) = testing::seeded_mapper()?;
        let id = Uuid::now_v7();
        let before = import(&mapper, OBJECT_GRAPH, id, &complex_document(&mapper, id))?;
        let tiles = mapper.store().resources.tiles(id)?;

        let mut broken = complex_document(&mapper, id);
        broken[crm("P2_has_type")] = concept(&mapper, Uuid::now_v7(), "E55_Type");
        assert!(import(&mapper, OBJECT_GRAPH, id, &broken).is_err());

        assert_eq!(mapper.store().resources.tiles(id)?, tiles);
        assert_eq!(mapper.export(id)?, before);
        Ok(())
    }

    #[test]
    fn compact_document_with_inline_context() -> Result<()> {
        let (_tmp_dir, mapper) = testing::seeded_mapper()?;
        let id = Uuid::now_v7();
        let doc = json!([{
            "@context": { "crm": CRM },
            "@id": mapper.iris().resource(id),
            "@type": "crm:E22_Man-Made_Object",
            "crm:P3_has_note": "test!"
        }]);

        let exported = import(&mapper, NOTE_GRAPH, id, &doc)?;
        assert_eq!(exported, note(&mapper, id, "test!"));

        let two = json!([note(&mapper, id, "a"), note(&mapper, id, "b")]);
        assert!(matches!(
            import(&mapper, NOTE_GRAPH, id, &two),
            Err(MapperError::SchemaMismatch(_))
        ));
        let remote = json!({
            "@context": "https://linked.art/ns/v1/linked-art.json",
            "@id": mapper.iris().resource(id)
        });
        assert!(matches!(
            import(&mapper, NOTE_GRAPH, id, &remote),
            Err(MapperError::SchemaMismatch(_))
        ));
        Ok(())
    }

    #[test]
    fn compact_and_full_keys_share_a_predicate() -> Result<()> {
        let (_tmp_dir, mapper) = testing::seeded_mapper()?;
        let id = Uuid::now_v7();
        let doc = json!({
            "@context": { "crm": CRM },
            "@id": mapper.iris().resource(id),
            "@type": "crm:E22_Man-Made_Object",
            "crm:P130_shows_features_of": feature(&mapper, FEATURE_A),
            crm("P130_shows_features_of"): feature(&mapper, FEATURE_B)
        });
        import(&mapper, OBJECT_GRAPH, id, &doc)?;
        let tiles = mapper.store().resources.tiles(id)?;
        assert_eq!(
            tiles[0].data.get(&FEATURES),
            Some(&TileValue::ResourceInstanceList(vec![FEATURE_A, FEATURE_B]))
        );

        let doc = json!({
            "@context": { "crm": CRM },
            "@id": mapper.iris().resource(id),
            "@type": "crm:E22_Man-Made_Object",
            "crm:P3_has_note": "one",
            crm("P3_has_note"): "two"
        });
        assert!(matches!(
            import(&mapper, OBJECT_GRAPH, id, &doc),
            Err(MapperError::CardinalityViolation(_))
        ));
        Ok(())
    }

    #[test]
    fn repeated_tiles_keep_language_tags() -> Result<()> {
        let (_tmp_dir, mapper) = testing::seeded_mapper()?;
        let id = Uuid::now_v7();
        let names = json!([
            { "@value": "Mona Lisa", "@language": "en" },
            { "@value": "La Joconde", "@language": "fr" }
        ]);
        let doc = json!({
            "@id": mapper.iris().resource(id),
            "@type": crm("E22_Man-Made_Object"),
            crm("P1_is_identified_by"): names.clone()
        });

        import(&mapper, OBJECT_GRAPH, id, &doc)?;
        let tiles = mapper.store().resources.tiles(id)?;
        assert_eq!(tiles.len(), 2);
        assert!(tiles.iter().all(|t| t.nodegroup_id == APPELLATION));

        let exported = mapper.export(id)?;
        let exported_names = get(&exported, "P1_is_identified_by").as_array().unwrap();
        assert_eq!(exported_names.len(), 2);
        for name in names.as_array().unwrap() {
            assert!(exported_names.contains(name));
        }
        Ok(())
    }

    #[test]
    fn tile_iri_keeps_tile_id() -> Result<()> {
        let (_tmp_dir, mapper) = testing::seeded_mapper()?;
        let id = Uuid::now_v7();
        let tile = Uuid::parse_str("9c1ec6b9-1094-427f-acf6-e9c3fca643b6")?;
        let mut doc = json!({
            "@id": mapper.iris().resource(id),
            "@type": crm("E22_Man-Made_Object"),
            crm("P160_has_temporal_projection"): {
                "@id": mapper.iris().tile_node(tile, TIMESPAN),
                "@type": crm("E52_Time-Span"),
                crm("P79_beginning_is_qualified_by"): "circa"
            }
        });

        let exported = import(&mapper, OBJECT_GRAPH, id, &doc)?;
        assert_eq!(exported, doc);
        assert_eq!(mapper.store().resources.tiles(id)?[0].tileid, tile);

        doc[crm("P160_has_temporal_projection")]["@id"] =
            json!(mapper.iris().tile_node(tile, OBJECT_TYPE));
        assert!(matches!(
            import(&mapper, OBJECT_GRAPH, id, &doc),
            Err(MapperError::SchemaMismatch(_))
        ));
        Ok(())
    }

    #[test]
    fn create_mints_a_resource_id() -> Result<()> {
        let (_tmp_dir, mapper) = testing::seeded_mapper()?;
        let schema = mapper.store().graphs.find(NOTE_GRAPH)?;
        let doc = json!({
            "@id": "http://example.org/drafts/1",
            "@type": crm("E22_Man-Made_Object"),
            crm("P3_has_note"): "created"
        });

        let (id, exported) = mapper.create(&schema, &doc)?;
        assert_eq!(exported, note(&mapper, id, "created"));
        assert_eq!(mapper.export(id)?, exported);
        Ok(())
    }

    #[test]
    fn resource_stays_in_its_graph() -> Result<()> {
        let (_tmp_dir, mapper) = testing::seeded_mapper()?;
        let doc = note(&mapper, FEATURE_A, "moved");
        assert!(matches!(
            import(&mapper, NOTE_GRAPH, FEATURE_A, &doc),
            Err(MapperError::SchemaMismatch(_))
        ));
        assert_eq!(
            *get(&mapper.export(FEATURE_A)?, "P3_has_note"),
            json!("first feature")
        );
        Ok(())
    }

    #[test]
    fn export_failures() -> Result<()> {
        let (_tmp_dir, mapper) = testing::seeded_mapper()?;
        assert!(matches!(
            mapper.export(Uuid::now_v7()),
            Err(MapperError::ResourceNotFound(_))
        ));

        let id = Uuid::now_v7();
        let mut tile = Tile::new(Uuid::now_v7(), id, OBJECT_TYPE, None);
        tile.data.insert(OBJECT_TYPE, TileValue::Concept(Uuid::now_v7()));
        mapper
            .store()
            .resources
            .replace(&ResourceInstance::new(id, OBJECT_GRAPH), &[tile])?;
        assert!(matches!(
            mapper.export(id),
            Err(MapperError::UnresolvedReference(_))
        ));
        Ok(())
    }
}
