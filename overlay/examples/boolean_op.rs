use std::path::{Path, PathBuf};

use clap::Parser;
use kurbo::DEFAULT_ACCURACY;
use overlay::{
    overlay_polygons, within::point_in_ring, MultiPolygon, OverlayOptions, OverlayType, Point,
    Polygon, Rect, Ring, RobustnessPolicy, Strategy,
};
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, clap::ValueEnum)]
enum Op {
    Union,
    Intersection,
    Difference,
}

impl From<Op> for OverlayType {
    fn from(op: Op) -> Self {
        match op {
            Op::Union => OverlayType::Union,
            Op::Intersection => OverlayType::Intersection,
            Op::Difference => OverlayType::Difference,
        }
    }
}

#[derive(Parser)]
struct Args {
    /// The first operand.
    a: PathBuf,
    /// The second operand.
    b: PathBuf,

    #[arg(short, long)]
    output: PathBuf,

    #[arg(long, value_enum, default_value = "union")]
    op: Op,

    /// Use exact predicates on the input coordinates, instead of rescaling.
    #[arg(long)]
    exact: bool,

    #[arg(long, default_value_t = 0.0)]
    cluster_tolerance: f64,
}

/// Flattens every closed subpath of an SVG into a ring.
fn svg_to_rings(tree: &usvg::Tree) -> Vec<Vec<Point>> {
    fn pt(p: usvg::tiny_skia_path::Point) -> kurbo::Point {
        kurbo::Point::new(p.x as f64, p.y as f64)
    }

    fn add_group(group: &usvg::Group, ret: &mut Vec<Vec<Point>>) {
        for child in group.children() {
            match child {
                usvg::Node::Group(group) => add_group(group, ret),
                usvg::Node::Path(path) => {
                    let kurbo_els = path.data().segments().map(|seg| match seg {
                        usvg::tiny_skia_path::PathSegment::MoveTo(p) => {
                            kurbo::PathEl::MoveTo(pt(p))
                        }
                        usvg::tiny_skia_path::PathSegment::LineTo(p) => {
                            kurbo::PathEl::LineTo(pt(p))
                        }
                        usvg::tiny_skia_path::PathSegment::QuadTo(p0, p1) => {
                            kurbo::PathEl::QuadTo(pt(p0), pt(p1))
                        }
                        usvg::tiny_skia_path::PathSegment::CubicTo(p0, p1, p2) => {
                            kurbo::PathEl::CurveTo(pt(p0), pt(p1), pt(p2))
                        }
                        usvg::tiny_skia_path::PathSegment::Close => kurbo::PathEl::ClosePath,
                    });

                    // Unclosed subpaths don't bound anything, so they're dropped.
                    let mut points = Vec::new();
                    kurbo::flatten(kurbo_els, DEFAULT_ACCURACY, |el| match el {
                        kurbo::PathEl::MoveTo(p) => {
                            points.clear();
                            points.push(Point::new(p.x, p.y));
                        }
                        kurbo::PathEl::LineTo(p) => points.push(Point::new(p.x, p.y)),
                        kurbo::PathEl::ClosePath => {
                            if points.len() >= 3 {
                                ret.push(std::mem::take(&mut points));
                            }
                            points.clear();
                        }
                        kurbo::PathEl::QuadTo(..) | kurbo::PathEl::CurveTo(..) => unreachable!(),
                    });
                }
                _ => {}
            }
        }
    }

    let mut ret = Vec::new();
    add_group(tree.root(), &mut ret);
    ret
}

/// Groups rings into polygons by nesting: a ring directly inside an exterior
/// is one of its holes, and a ring inside a hole starts a new polygon.
fn rings_to_multi_polygon(mut rings: Vec<Vec<Point>>) -> MultiPolygon {
    let strategy = Strategy::exact();
    let area = |r: &[Point]| Ring(r.to_vec()).area();
    rings.sort_by(|a, b| area(b).total_cmp(&area(a)));

    let mut polygons: Vec<Polygon> = Vec::new();
    for ring in rings {
        let inside = |r: &Ring| {
            ring.iter()
                .any(|p| point_in_ring(p, &r.0, &strategy) == overlay::within::Location::Inside)
        };
        // The rings are sorted by decreasing area, so the last match is the innermost.
        match polygons.iter_mut().rev().find(|poly| inside(&poly.exterior)) {
            Some(poly) if !poly.interiors.iter().any(inside) => poly.interiors.push(Ring(ring)),
            _ => polygons.push(Polygon::new(Ring(ring), Vec::new())),
        }
    }
    MultiPolygon(polygons)
}

fn load(path: &Path) -> anyhow::Result<MultiPolygon> {
    let input = std::fs::read_to_string(path)?;
    let tree = usvg::Tree::from_str(&input, &usvg::Options::default())?;
    let rings = svg_to_rings(&tree);
    tracing::info!(path = %path.display(), rings = rings.len(), "loaded");
    Ok(rings_to_multi_polygon(rings))
}

pub fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let a = load(&args.a)?;
    let b = load(&args.b)?;
    let options = OverlayOptions::default()
        .with_overlay_type(args.op.into())
        .with_robustness(if args.exact {
            RobustnessPolicy::Exact
        } else {
            RobustnessPolicy::Rescale
        })
        .with_cluster_tolerance(args.cluster_tolerance);
    let result = overlay_polygons(&a, &b, &options)?;
    tracing::info!(
        polygons = result.0.len(),
        area = result.area(),
        "computed overlay"
    );

    let bbox = match (a.envelope(), b.envelope()) {
        (Some(ea), Some(eb)) => ea.union(&eb),
        (ea, eb) => ea.or(eb).unwrap_or(Rect::new((0.0, 0.0), (1.0, 1.0))),
    };
    let pad = 1.0;
    let mut document = svg::Document::new().set(
        "viewBox",
        (
            bbox.min.x - pad,
            bbox.min.y - pad,
            bbox.width() + 2.0 * pad,
            bbox.height() + 2.0 * pad,
        ),
    );

    for polygon in &result.0 {
        let mut data = svg::node::element::path::Data::new();
        for ring in polygon.rings() {
            let mut points = ring.open_points().iter();
            let Some(p) = points.next() else {
                continue;
            };
            data = data.move_to((p.x, p.y));
            for p in points {
                data = data.line_to((p.x, p.y));
            }
            data = data.close();
        }
        let path = svg::node::element::Path::new()
            .set("d", data)
            .set("fill", "black")
            .set("fill-rule", "evenodd");
        document = document.add(path);
    }

    svg::save(&args.output, &document)?;

    Ok(())
}
