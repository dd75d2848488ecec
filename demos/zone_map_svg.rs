use plotters::prelude::*;
use carmsim::controls::ControlState;
use carmsim::sweep::{linspace, zone_map};
use carmsim::{PatientBounds, SimConfig, Skeleton, Zone};

const PALETTE: [RGBColor; Zone::COUNT] = [
    RGBColor(228, 26, 28),   // head
    RGBColor(55, 126, 184),  // thorax
    RGBColor(77, 175, 74),   // abdomen
    RGBColor(152, 78, 163),  // pelvis
    RGBColor(255, 127, 0),   // shoulder
    RGBColor(255, 217, 47),  // humerus
    RGBColor(166, 86, 40),   // forearm
    RGBColor(247, 129, 191), // hand
    RGBColor(102, 194, 165), // femur
    RGBColor(252, 141, 98),  // knee
    RGBColor(141, 160, 203), // tibia
    RGBColor(231, 138, 195), // ankle
    RGBColor(166, 216, 84),  // foot
    RGBColor(235, 235, 235), // miss
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = SimConfig::default();
    let skeleton = Skeleton::standard();
    let bounds = PatientBounds::capture([-0.25, -0.85, -0.15], [0.25, 0.85, 0.15])?;
    let patient = config.patient.transform();

    run_example("zone_map_defaults.svg", &config, &skeleton, &bounds, &patient, ControlState::new(config.controls))?;

    let raised = ControlState::new(config.controls).with(carmsim::Control::Lift, 0.0);
    run_example("zone_map_lift_zero.svg", &config, &skeleton, &bounds, &patient, raised)?;

    Ok(())
}

fn run_example(
    filename: &str,
    config: &SimConfig,
    skeleton: &Skeleton,
    bounds: &PatientBounds,
    patient: &carmsim::Transform,
    base: ControlState,
) -> Result<(), Box<dyn std::error::Error>> {
    let x_range = config.controls.cart_x;
    let (x_min, x_max) = (x_range.min, x_range.max);
    let (z_min, z_max) = (-0.8, 0.8);
    let (nx, nz) = (261, 161);
    let xs = linspace(x_min, x_max, nx);
    let zs = linspace(z_min, z_max, nz);
    let map = zone_map(config, skeleton, bounds, patient, &base, &xs, &zs);

    let root = SVGBackend::new(filename, (1300, 700)).into_drawing_area();
    root.fill(&WHITE)?;
    let (plot, legend) = root.split_horizontally(1100);

    let mut chart = ChartBuilder::on(&plot)
        .caption("Beam target by cart position", ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, z_min..z_max)?;
    chart.configure_mesh().x_desc("cart_x [m]").y_desc("cart_z [m]").disable_mesh().draw()?;

    let dx = (x_max - x_min) / (nx - 1) as f64;
    let dz = (z_max - z_min) / (nz - 1) as f64;
    for (iz, &z) in zs.iter().enumerate() {
        for (ix, &x) in xs.iter().enumerate() {
            let Some(zone) = map.get(ix, iz) else { continue };
            chart.draw_series(std::iter::once(Rectangle::new(
                [(x - 0.5 * dx, z - 0.5 * dz), (x + 0.5 * dx, z + 0.5 * dz)],
                PALETTE[zone.index()].filled(),
            )))?;
        }
    }

    let counts = map.histogram();
    for (i, zone) in Zone::ALL.iter().enumerate() {
        let y = 40 + i as i32 * 40;
        legend.draw(&Rectangle::new([(10, y), (30, y + 20)], PALETTE[i].filled()))?;
        legend.draw(&Text::new(
            format!("{} ({})", zone.label(), counts[i]),
            (38, y + 4),
            ("sans-serif", 14),
        ))?;
    }

    root.present()?;
    println!("wrote {}", filename);
    Ok(())
}
