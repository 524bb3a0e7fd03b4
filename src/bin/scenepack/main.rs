//! scenepack CLI - export demo scenes and inspect packages.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use scenepack::archive::zip::read_entries;
use scenepack::dataset::{sources, MultiBlock};
use scenepack::prelude::*;

#[derive(Parser)]
#[command(name = "scenepack")]
#[command(about = "Scene export and LOD publishing for web viewers")]
struct Cli {
    /// Log debug output (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    /// Plain files under a directory
    Dir,
    /// One zip file
    Zip,
    /// One zip per entry, under a directory
    Partitioned,
}

#[derive(Subcommand)]
enum Command {
    /// Export a generated demo scene
    Demo {
        /// Output directory or zip file
        output: PathBuf,

        #[arg(long, value_enum, default_value = "dir")]
        format: Format,

        /// Export options as JSON (missing keys keep defaults)
        #[arg(long)]
        options: Option<PathBuf>,

        /// Write polygon LODs down to this many bytes
        #[arg(long)]
        poly_lods: Option<usize>,

        /// Write texture LODs down to this many bytes
        #[arg(long)]
        texture_lods: Option<usize>,

        /// Also publish the scene graph document and its arrays to this directory
        #[arg(long)]
        scene_graph: Option<PathBuf>,
    },

    /// List the entries of a zip package
    List {
        archive: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_target(false)
        .init();

    match cli.command {
        Command::Demo {
            output,
            format,
            options,
            poly_lods,
            texture_lods,
            scene_graph,
        } => {
            let mut opts = match options {
                Some(path) => ExportOptions::from_json_file(&path)
                    .with_context(|| format!("reading options {}", path.display()))?,
                None => ExportOptions::default(),
            };
            if let Some(size) = poly_lods {
                opts = opts.with_poly_lods(true, size);
            }
            if let Some(size) = texture_lods {
                opts = opts.with_texture_lods(true, size);
            }
            demo(&output, format, opts, scene_graph.as_deref())
        }
        Command::List { archive } => list(&archive),
    }
}

fn demo(output: &Path, format: Format, options: ExportOptions, scene_graph: Option<&Path>) -> Result<()> {
    let scene = demo_scene();
    let exporter = SceneExporter::new(options);

    let stats = match format {
        Format::Dir => {
            let mut sink = DirectoryArchive::new(output);
            exporter.export(&scene, &mut sink)?
        }
        Format::Zip => {
            let mut sink = BufferedArchive::new(output.display().to_string());
            let stats = exporter.export(&scene, &mut sink)?;
            let Some(bytes) = sink.into_buffer() else {
                bail!("zip archive produced no data");
            };
            fs::write(output, bytes).with_context(|| format!("writing {}", output.display()))?;
            stats
        }
        Format::Partitioned => {
            let mut sink = PartitionedArchive::new();
            let stats = exporter.export(&scene, &mut sink)?;
            for (name, bytes) in sink.iter() {
                let path = output.join(format!("{name}.zip"));
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
            }
            info!("{} partitions", sink.number_of_buffers());
            stats
        }
    };

    if let Some(path) = scene_graph {
        let mut serializer = SceneGraphSerializer::new();
        serializer.serialize_scene(&scene)?;
        let mut sink = DirectoryArchive::new(path);
        let blobs = serializer
            .publish(&mut sink)
            .with_context(|| format!("publishing scene graph to {}", path.display()))?;
        info!(
            "scene graph: {} nodes, {} datasets, {} blobs",
            serializer.num_nodes(),
            serializer.data_objects().len(),
            blobs
        );
    }

    println!(
        "datasets: {} written, {} skipped | textures: {} | texture LOD steps: {} | polygon LOD steps: {}",
        stats.datasets_written,
        stats.datasets_skipped,
        stats.textures_written,
        stats.texture_lod_steps,
        stats.poly_lod_steps
    );
    Ok(())
}

fn list(path: &Path) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let entries = read_entries(&bytes)?;
    for entry in &entries {
        println!("{:>10}  {}", entry.data.len(), entry.name);
    }
    println!("{} entries", entries.len());
    Ok(())
}

/// Sphere colored by elevation, a textured floor, and a two-block composite.
fn demo_scene() -> Scene {
    let mut scene = Scene::new();
    let window = scene.add_window(RenderWindow::default());
    let camera = scene.add_camera(Camera {
        position: [0.0, -6.0, 3.0],
        view_up: [0.0, 0.0, 1.0],
        ..Default::default()
    });
    let light = scene.add_light(Light::default());
    let renderer = scene.add_renderer(Renderer {
        active_camera: Some(camera),
        lights: vec![light],
        ..Default::default()
    });
    if let Some(w) = scene.render_window_mut(window) {
        w.renderers.push(renderer);
    }

    let mut props = Vec::new();

    let lut = scene.add_lookup_table(LookupTable::default());
    let sphere = scene.add_data(sources::sphere(1.0, 64, 32).into());
    let mapper = scene.add_mapper(Mapper {
        input: Some(sphere),
        lookup_table: Some(lut),
        color_by_array_name: Some("Elevation".into()),
        scalar_mode: ScalarMode::UsePointFieldData,
        scalar_range: [-1.0, 1.0],
        ..Default::default()
    });
    props.push(scene.add_actor(Actor {
        mapper: Some(mapper),
        position: [0.0, 0.0, 1.0],
        ..Default::default()
    }));

    let image = scene.add_data(sources::checkerboard(256, 256, 32).into());
    let texture = scene.add_texture(Texture {
        image: Some(image),
        ..Default::default()
    });
    let floor = scene.add_data(sources::plane(8.0, 8, 8).into());
    let mapper = scene.add_mapper(Mapper {
        input: Some(floor),
        scalar_visibility: false,
        ..Default::default()
    });
    props.push(scene.add_actor(Actor {
        mapper: Some(mapper),
        texture: Some(texture),
        ..Default::default()
    }));

    let mut blocks = MultiBlock::new();
    blocks.push(Some(sources::sphere(0.4, 16, 8).into()));
    blocks.push(Some(sources::sphere(0.6, 16, 8).into()));
    let blocks = scene.add_data(blocks.into());
    let mut display = CompositeDisplayAttributes::default();
    display.set_color(1, [0.9, 0.3, 0.2]);
    display.set_opacity(2, 0.5);
    let mapper = scene.add_mapper(Mapper {
        kind: MapperKind::Composite(display),
        input: Some(blocks),
        scalar_visibility: false,
        ..Default::default()
    });
    props.push(scene.add_actor(Actor {
        mapper: Some(mapper),
        position: [2.5, 0.0, 0.6],
        orientation: [0.0, 0.0, 45.0],
        ..Default::default()
    }));

    if let Some(r) = scene.renderer_mut(renderer) {
        r.props = props;
    }
    scene
}
