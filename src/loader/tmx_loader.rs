// src/loader/tmx_loader.rs
use crate::error::MapError;
use crate::layer::{Layer, MapObject, ObjectLayer, ObjectShape, TileLayer};
use crate::loader::xml::{self, XmlNode};
use crate::loader::LoaderContext;
use crate::map::Map;
use crate::properties::{Properties, PropertyValue};
use crate::tile::TileCell;
use crate::tileset::{atlas_rects, TileSheet};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use macroquad::prelude::*;
use std::path::{Path, PathBuf};

const MEMORY_ORIGIN: &str = "<memory>";
/// Bytes skipped at the start of decoded base64 cell data.
const BASE64_HEADER_LEN: usize = 4;
/// Tiled's default for text objects without `pixelsize`.
const DEFAULT_FONT_SIZE: u32 = 16;

pub(crate) fn load_map_file<T>(
    path: &Path,
    ctx: &LoaderContext<T>,
    map: &mut Map<T>,
) -> Result<(), MapError> {
    log::info!("Loading map {}", path.display());
    let text = ctx.load_text(path)?;
    let base_dir = path
        .parent()
        .map(|d| d.to_path_buf())
        .unwrap_or_default();

    let reader = TmxReader {
        ctx,
        base_dir,
        origin: path.display().to_string(),
    };
    reader.read_map(&text, map)
}

pub(crate) fn load_map_str<T>(
    content: &str,
    ctx: &LoaderContext<T>,
    map: &mut Map<T>,
) -> Result<(), MapError> {
    log::info!("Loading map from memory");
    let reader = TmxReader {
        ctx,
        base_dir: PathBuf::new(),
        origin: MEMORY_ORIGIN.to_owned(),
    };
    reader.read_map(content, map)
}

/// State of one load: relative paths resolve against `base_dir` only for
/// as long as this value lives.
struct TmxReader<'c, T> {
    ctx: &'c LoaderContext<T>,
    base_dir: PathBuf,
    origin: String,
}

impl<T> TmxReader<'_, T> {
    fn read_map(&self, text: &str, map: &mut Map<T>) -> Result<(), MapError> {
        let root =
            xml::parse_document(text).map_err(|reason| MapError::parse(&self.origin, reason))?;
        if root.name != "map" {
            return Err(MapError::parse(
                &self.origin,
                format!("expected <map> root, found <{}>", root.name),
            ));
        }

        let orientation = root.attr("orientation").unwrap_or_default();
        if orientation != "orthogonal" {
            return Err(MapError::UnsupportedFormat(format!(
                "`{orientation}` orientation, only orthogonal maps are supported"
            )));
        }

        map.width = root.attr_or("width", 0);
        map.height = root.attr_or("height", 0);
        map.tile_size = vec2(root.attr_or("tilewidth", 0.0), root.attr_or("tileheight", 0.0));

        for child in &root.children {
            match child.name.as_str() {
                "tileset" => self.read_tileset_ref(child, map)?,
                "properties" => map.properties = read_properties(child),
                "objectgroup" => map.layers.push(read_object_layer(child)),
                "layer" => map
                    .layers
                    .push(read_tile_layer(child, map.width, map.height, map.tile_size)),
                other => log::debug!("Skipping <{other}> in {}", self.origin),
            }
        }

        if map.sheets.is_empty() {
            return Err(MapError::EmptyMap);
        }

        log::info!(
            "Loaded {}: {}x{} cells, {} sheets, {} layers",
            self.origin,
            map.width,
            map.height,
            map.sheets.len(),
            map.layers.len()
        );
        Ok(())
    }

    fn read_tileset_ref(&self, node: &XmlNode, map: &mut Map<T>) -> Result<(), MapError> {
        let first_gid: u32 = node.attr_or("firstgid", 0);

        match node.attr("source").filter(|s| !s.is_empty()) {
            Some(source) => {
                let path = self.base_dir.join(source);
                let origin = path.display().to_string();
                let text = self.ctx.load_text(&path)?;
                let root = xml::parse_document(&text)
                    .map_err(|reason| MapError::parse(&origin, reason))?;
                if root.name != "tileset" {
                    return Err(MapError::parse(
                        &origin,
                        format!("expected <tileset> root, found <{}>", root.name),
                    ));
                }
                let dir = path.parent().map(|d| d.to_path_buf()).unwrap_or_default();
                self.read_tileset(&root, first_gid, &dir, &origin, map)
            }
            None => self.read_tileset(node, first_gid, &self.base_dir, &self.origin, map),
        }
    }

    fn read_tileset(
        &self,
        node: &XmlNode,
        first_gid: u32,
        dir: &Path,
        origin: &str,
        map: &mut Map<T>,
    ) -> Result<(), MapError> {
        let name = node.attr("name").unwrap_or_default();
        let first_id = u16::try_from(first_gid).map_err(|_| {
            MapError::parse(
                origin,
                format!("tileset `{name}` firstgid {first_gid} exceeds 16-bit tile ids"),
            )
        })?;

        let tile_w: u32 = node.attr_or("tilewidth", 0);
        let tile_h: u32 = node.attr_or("tileheight", 0);
        if tile_w == 0 || tile_h == 0 {
            return Err(MapError::parse(origin, format!("tileset `{name}` has no tile size")));
        }

        let spacing: u32 = node.attr_or("spacing", 0);
        let margin: u32 = node.attr_or("margin", 0);
        if tile_w.checked_add(spacing).is_none() || tile_h.checked_add(spacing).is_none() {
            return Err(MapError::parse(
                origin,
                format!("tileset `{name}` spacing {spacing} is out of range"),
            ));
        }

        let Some(image) = node.child("image") else {
            log::warn!("Tileset `{name}` in {origin} is an image collection; skipped");
            return Ok(());
        };
        let source = image
            .attr("source")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                MapError::parse(origin, format!("tileset `{name}` image has no source"))
            })?;

        let texture = self.ctx.load_texture(&dir.join(source))?;
        let tiles = atlas_rects(
            image.attr_or("width", 0),
            image.attr_or("height", 0),
            tile_w,
            tile_h,
            spacing,
            margin,
        );

        log::debug!(
            "Tileset `{name}` from {origin}: ids {first_id}..{}",
            first_id as usize + tiles.len()
        );
        map.sheets.insert(first_id, TileSheet::new(texture, first_id, tiles));
        Ok(())
    }
}

fn read_layer_common(node: &XmlNode, layer: &mut Layer) {
    layer.visible = node.attr_or("visible", 1u8) != 0;
    if let Some(props) = node.child("properties") {
        layer.properties = read_properties(props);
    }
}

fn read_tile_layer(node: &XmlNode, width: u32, height: u32, tile_size: Vec2) -> Layer {
    let name = node.attr("name").unwrap_or_default();
    let mut tiles = TileLayer::new(width, height, tile_size);

    match node.child("data") {
        Some(data) => tiles.cells = decode_cells(data, name),
        None => log::warn!("Layer `{name}` has no <data>; left empty"),
    }

    let expected = width as usize * height as usize;
    if !tiles.cells.is_empty() && tiles.cells.len() != expected {
        log::warn!(
            "Layer `{name}` decoded {} cells, grid holds {expected}",
            tiles.cells.len()
        );
    }

    let mut layer = Layer::tile(name, node.attr_or("id", 0), tiles);
    read_layer_common(node, &mut layer);
    log::debug!("Tile layer `{}` (id {})", layer.name, layer.id);
    layer
}

/// Decodes a `<data>` element. Anything undecodable yields no cells so the
/// rest of the map still loads.
fn decode_cells(data: &XmlNode, layer_name: &str) -> Vec<TileCell> {
    let decoded = match data.attr("encoding").unwrap_or_default() {
        "csv" => decode_csv(data.text()),
        "base64" => match data.attr("compression").unwrap_or_default() {
            "" => decode_base64(data.text()),
            scheme @ ("zlib" | "gzip" | "zstd") => {
                log::warn!("Layer `{layer_name}`: {scheme} data is not decoded; left empty");
                Ok(Vec::new())
            }
            other => Err(format!("unknown compression `{other}`")),
        },
        "" => Ok(data
            .children_named("tile")
            .map(|t| TileCell::from_gid(t.attr_or("gid", 0)))
            .collect()),
        other => Err(format!("unknown encoding `{other}`")),
    };

    decoded.unwrap_or_else(|reason| {
        log::warn!("Layer `{layer_name}`: {reason}; left empty");
        Vec::new()
    })
}

/// Comma separated values, one grid row per line. A trailing comma at the
/// end of a line is allowed; any other empty field is an empty cell.
pub(crate) fn decode_csv(text: &str) -> Result<Vec<TileCell>, String> {
    let mut cells = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let mut fields = line.split(',').peekable();
        while let Some(field) = fields.next() {
            let field = field.trim();
            if field.is_empty() {
                if fields.peek().is_some() {
                    cells.push(TileCell::EMPTY);
                }
                continue;
            }
            let raw: u32 = field
                .parse()
                .map_err(|_| format!("bad csv value `{field}`"))?;
            cells.push(TileCell::from_gid(raw));
        }
    }
    Ok(cells)
}

/// Uncompressed base64: a 4 byte header, then little-endian `u32` GIDs.
pub(crate) fn decode_base64(text: &str) -> Result<Vec<TileCell>, String> {
    let compact: String = text.split_whitespace().collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| format!("bad base64 data: {e}"))?;

    let payload = bytes.get(BASE64_HEADER_LEN..).unwrap_or_default();
    Ok(payload
        .chunks_exact(4)
        .map(|b| TileCell::from_gid(u32::from_le_bytes([b[0], b[1], b[2], b[3]])))
        .collect())
}

fn read_object_layer(node: &XmlNode) -> Layer {
    let objects = node.children_named("object").map(read_object).collect();
    let mut layer = Layer::object(
        node.attr("name").unwrap_or_default(),
        node.attr_or("id", 0),
        ObjectLayer {
            objects,
            draw_fn: None,
        },
    );
    read_layer_common(node, &mut layer);
    log::debug!(
        "Object layer `{}` (id {}) with {} objects",
        layer.name,
        layer.id,
        layer.as_object().map_or(0, |o| o.objects.len())
    );
    layer
}

fn parse_points(points: &str) -> Vec<Vec2> {
    points
        .split_whitespace()
        .filter_map(|pair| {
            let (x, y) = pair.split_once(',')?;
            Some(vec2(x.trim().parse().ok()?, y.trim().parse().ok()?))
        })
        .collect()
}

fn read_object(node: &XmlNode) -> MapObject {
    let shape = if let Some(poly) = node.child("polygon") {
        ObjectShape::Polygon(parse_points(poly.attr("points").unwrap_or_default()))
    } else if let Some(line) = node.child("polyline") {
        ObjectShape::Polyline(parse_points(line.attr("points").unwrap_or_default()))
    } else if node.child("ellipse").is_some() {
        ObjectShape::Ellipse
    } else if node.child("point").is_some() {
        ObjectShape::Point
    } else if let Some(text) = node.child("text") {
        ObjectShape::Text {
            text: text.text().to_owned(),
            font_size: text.attr_or("pixelsize", DEFAULT_FONT_SIZE),
        }
    } else {
        ObjectShape::Rectangle
    };

    let class = node
        .attr("class")
        .or_else(|| node.attr("type"))
        .unwrap_or_default();

    MapObject {
        id: node.attr_or("id", 0),
        name: node.attr("name").unwrap_or_default().to_owned(),
        class: class.to_owned(),
        bounds: Rect::new(
            node.attr_or("x", 0.0),
            node.attr_or("y", 0.0),
            node.attr_or("width", 0.0),
            node.attr_or("height", 0.0),
        ),
        rotation: node.attr_or("rotation", 0.0),
        visible: node.attr_or("visible", 1u8) != 0,
        tile: node.parse_attr::<u32>("gid").map(TileCell::from_gid),
        shape,
        properties: node.child("properties").map(read_properties).unwrap_or_default(),
    }
}

fn read_properties(node: &XmlNode) -> Properties {
    let mut props = Properties::new();
    for prop in node.children_named("property") {
        let Some(name) = prop.attr("name") else {
            continue;
        };
        // multi-line strings are stored as element text
        let raw = prop.attr("value").unwrap_or_else(|| prop.text());

        let value = match prop.attr("type").unwrap_or("string") {
            "bool" => raw.parse().ok().map(PropertyValue::Bool),
            "int" | "object" => raw.parse().ok().map(PropertyValue::I64),
            "float" => raw.parse().ok().map(PropertyValue::F32),
            "string" | "file" | "color" => Some(PropertyValue::String(raw.to_owned())),
            other => {
                log::warn!("Skipping property `{name}` of unsupported type `{other}`");
                continue;
            }
        };

        match value {
            Some(value) => props.insert(name, value),
            None => log::warn!("Skipping property `{name}`: cannot parse `{raw}`"),
        }
    }
    props
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::LayerType;
    use crate::tile::TileFlags;

    fn indices(cells: &[TileCell]) -> Vec<u16> {
        cells.iter().map(|c| c.index).collect()
    }

    fn base64_of(words: &[u32]) -> String {
        let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        STANDARD.encode(bytes)
    }

    #[test]
    fn csv_rows_decode_row_major_without_flags() {
        let cells = decode_csv("1,2,3\n4,5,0\n").unwrap();
        assert_eq!(indices(&cells), vec![1, 2, 3, 4, 5, 0]);
        assert!(cells.iter().all(|c| c.flags == TileFlags::NONE));
    }

    #[test]
    fn csv_tolerates_trailing_comma_and_blank_lines() {
        let cells = decode_csv("\n  1,2,\n\n  3,2147483653\n").unwrap();
        assert_eq!(indices(&cells), vec![1, 2, 3, 5]);
        assert!(cells[3].flags.flip_h());
    }

    #[test]
    fn csv_rejects_garbage() {
        assert!(decode_csv("1,x,3").is_err());
        assert!(decode_csv("1,-2").is_err());
    }

    #[test]
    fn csv_empty_field_is_an_empty_cell() {
        let cells = decode_csv("1,,3,
,4,5").unwrap();
        assert_eq!(indices(&cells), vec![1, 0, 3, 0, 4, 5]);
    }

    #[test]
    fn base64_skips_header_and_reads_little_endian() {
        let text = format!("\n   {}\n  ", base64_of(&[0xDEAD_BEEF, 7, 0x8000_0005, 0]));
        let cells = decode_base64(&text).unwrap();
        assert_eq!(indices(&cells), vec![7, 5, 0]);
        assert!(cells[1].flags.flip_h());
    }

    #[test]
    fn base64_shorter_than_header_is_empty() {
        assert!(decode_base64(&STANDARD.encode([1u8, 2])).unwrap().is_empty());
        assert!(decode_base64("***").is_err());
    }

    #[test]
    fn compressed_data_is_recognised_and_left_empty() {
        for scheme in ["zlib", "gzip", "zstd"] {
            let doc = format!(
                r#"<data encoding="base64" compression="{scheme}">{}</data>"#,
                base64_of(&[0, 1, 2, 3])
            );
            let data = xml::parse_document(&doc).unwrap();
            assert!(decode_cells(&data, "l").is_empty(), "{scheme} should decode to zero cells");
        }
    }

    #[test]
    fn xml_tile_elements_decode() {
        let doc = r#"<data><tile gid="3"/><tile/><tile gid="1073741826"/></data>"#;
        let data = xml::parse_document(doc).unwrap();
        let cells = decode_cells(&data, "l");
        assert_eq!(indices(&cells), vec![3, 0, 2]);
        assert!(cells[2].flags.flip_v());
    }

    #[test]
    fn tile_layer_takes_map_dimensions_and_attributes() {
        let node = xml::parse_document(
            r#"<layer id="4" name="Ground" width="99" height="99" visible="0">
                 <properties><property name="solid" type="bool" value="true"/></properties>
                 <data encoding="csv">1,2,3,4</data>
               </layer>"#,
        )
        .unwrap();
        let layer = read_tile_layer(&node, 2, 2, vec2(8.0, 8.0));
        assert_eq!(layer.id, 4);
        assert_eq!(layer.name, "Ground");
        assert!(!layer.visible);
        assert!(!layer.check_for_collisions);
        assert_eq!(layer.properties.get_bool("solid"), Some(true));

        let tiles = layer.as_tile().unwrap();
        assert_eq!((tiles.width, tiles.height), (2, 2));
        assert_eq!(tiles.tile_size, vec2(8.0, 8.0));
        assert_eq!(tiles.tile_at(1, 1), Some(4));
    }

    #[test]
    fn object_group_decodes_every_shape() {
        let node = xml::parse_document(
            r#"<objectgroup id="5" name="Collision">
                 <object id="1" name="wall" type="solid" x="10" y="20" width="30" height="40"/>
                 <object id="2" x="5" y="6"><point/></object>
                 <object id="3" x="0" y="0" width="8" height="8"><ellipse/></object>
                 <object id="4" x="1" y="2"><polygon points="0,0 16,0 16,16"/></object>
                 <object id="5" class="sign" x="0" y="0" width="64" height="20">
                   <text pixelsize="12" wrap="1">Hello there</text>
                 </object>
                 <object id="6" gid="2147483650" x="0" y="32" width="16" height="16" visible="0">
                   <properties><property name="hp" type="int" value="3"/></properties>
                 </object>
               </objectgroup>"#,
        )
        .unwrap();

        let layer = read_object_layer(&node);
        assert_eq!(layer.layer_type(), LayerType::Object);
        assert_eq!((layer.id, layer.name.as_str()), (5, "Collision"));

        let objects = &layer.as_object().unwrap().objects;
        assert_eq!(objects.len(), 6);

        assert_eq!(objects[0].shape, ObjectShape::Rectangle);
        assert_eq!(objects[0].class, "solid");
        assert_eq!(objects[0].bounds, Rect::new(10.0, 20.0, 30.0, 40.0));
        assert_eq!(objects[1].shape, ObjectShape::Point);
        assert_eq!(objects[2].shape, ObjectShape::Ellipse);
        assert_eq!(
            objects[3].shape,
            ObjectShape::Polygon(vec![vec2(0.0, 0.0), vec2(16.0, 0.0), vec2(16.0, 16.0)])
        );
        assert_eq!(
            objects[4].shape,
            ObjectShape::Text {
                text: "Hello there".into(),
                font_size: 12
            }
        );
        assert_eq!(objects[4].class, "sign");

        let tile_obj = &objects[5];
        assert!(!tile_obj.visible);
        assert_eq!(tile_obj.tile.map(|c| c.index), Some(2));
        assert_eq!(tile_obj.properties.get_i32("hp"), Some(3));
    }

    #[test]
    fn properties_are_typed_and_unknown_types_skipped() {
        let node = xml::parse_document(
            r##"<properties>
                 <property name="night" type="bool" value="true"/>
                 <property name="gravity" type="float" value="9.5"/>
                 <property name="theme" value="forest"/>
                 <property name="tint" type="color" value="#ff00ff00"/>
                 <property name="target" type="object" value="12"/>
                 <property name="broken" type="int" value="lots"/>
                 <property name="nested" type="class"/>
                 <property name="story">line one
line two</property>
               </properties>"##,
        )
        .unwrap();

        let props = read_properties(&node);
        assert_eq!(props.get_bool("night"), Some(true));
        assert_eq!(props.get_f32("gravity"), Some(9.5));
        assert_eq!(props.get_string("theme"), Some("forest"));
        assert_eq!(props.get_string("tint"), Some("#ff00ff00"));
        assert_eq!(props.get_i64("target"), Some(12));
        assert_eq!(props.get_string("story"), Some("line one\nline two"));
        assert!(props.get("broken").is_none());
        assert!(props.get("nested").is_none());
        assert_eq!(props.len(), 6);
    }
}
