use keystone::config::demo::{self as cfg, DemoConfig};
use keystone::detector::RecordedSegments;
use keystone::diagnostics::timing::elapsed_ms;
use keystone::diagnostics::CorrectionReport;
use keystone::homography::output_extent;
use keystone::image::io::{load_rgb_image, read_json_file, save_grayscale_f32, write_json_file};
use keystone::lines::RawSegment;
use keystone::session::CorrectionSession;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Instant;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = cfg::load_config(Path::new(&config_path))?;

    fs::create_dir_all(&config.output.dir)
        .map_err(|e| format!("Failed to create {}: {e}", config.output.dir.display()))?;

    let start = Instant::now();
    let rgb = load_rgb_image(&config.input)?;
    let segments: Vec<RawSegment> = read_json_file(&config.segments)?;
    println!(
        "Loaded {}x{} image and {} segments",
        rgb.w,
        rgb.h,
        segments.len()
    );

    let mut session = CorrectionSession::new(config.stages.resolve());
    session.set_rgb_buffer(
        &rgb,
        config.buffer.x_off,
        config.buffer.y_off,
        config.buffer.scale,
        config.is_raw,
    );
    if let Some(o) = &config.orientation {
        session.update_orientation(o.input_diagonal, o.output_diagonal);
    }
    save_buffer(&session, &config)?;

    let report = correct(&mut session, &config, RecordedSegments(segments), start);
    report.print_text_summary();

    write_json_file(&config.output.result_path(), &report)?;
    println!(
        "Wrote correction report to {}",
        config.output.result_path().display()
    );
    Ok(())
}

fn correct(
    session: &mut CorrectionSession,
    config: &DemoConfig,
    detector: RecordedSegments,
    start: Instant,
) -> CorrectionReport {
    let (width, height) = session
        .image_size()
        .map(|(w, h)| (w.round() as usize, h.round() as usize))
        .unwrap_or((0, 0));
    let mut params = config.params;
    let mut report = CorrectionReport::new(width, height, params);
    report.flipped = session.is_flipped();
    report.timing.push("load", elapsed_ms(start));

    let t = Instant::now();
    match session.acquire_structure(&detector, config.enhance) {
        Ok(structure) => {
            report.timing.extend(&structure.timing);
            report.structure = Some(structure);
        }
        Err(err) => report.error = Some(err.to_string()),
    }
    report.timing.push("structure", elapsed_ms(t));

    if report.error.is_none() {
        let t = Instant::now();
        match session.fit(&mut params, config.axis.to_axis(), &detector) {
            Ok(fit) => {
                report.fit = Some(fit);
                report.crop = Some(params.crop);
            }
            Err(err) => report.error = Some(err.to_string()),
        }
        report.timing.push("fit", elapsed_ms(t));
    }

    let (out_w, out_h) = output_extent(&params, width, height);
    report.output_size = [out_w, out_h];
    report.params = params;
    report.timing.total_ms = elapsed_ms(start);
    report
}

fn save_buffer(session: &CorrectionSession, config: &DemoConfig) -> Result<(), String> {
    let (Some(path), Some(buffer)) = (config.output.buffer_path(), session.buffer()) else {
        return Ok(());
    };
    let prepared = buffer.prepared(config.enhance);
    save_grayscale_f32(&prepared, &path)?;
    println!("Saved detection buffer to {}", path.display());
    Ok(())
}

fn usage() -> String {
    "Usage: keystone_demo <config.json>".to_string()
}
