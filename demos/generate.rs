// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

use std::path::Path;

use causal_dgp::{
    by_name,
    dgp::Newsletter,
    io,
    model::{display::CsvFormatter, Dataset},
    plots::{Binscatter, Dag, HypothesisTest, ProjectionAnimation, RegressionAnimation},
    simulate, stats, GenerateOptions, MonteCarloOptions, PlotConfig, Redraw,
};

fn naive_estimate(ds: &Dataset) -> anyhow::Result<f64> {
    Ok(stats::difference_in_means(&ds.outcome()?, &ds.treatment()?)?)
}

fn show(name: &str) -> anyhow::Result<()> {
    let dgp = by_name(name)?;
    let ds = dgp.generate_data(&GenerateOptions::default().seed(7))?;
    println!("{} rows of {}:", ds.num_rows(), name);
    println!("{}", CsvFormatter::head(&ds, 5));
    Ok(())
}

fn monte_carlo() -> anyhow::Result<()> {
    let opts = MonteCarloOptions::default().samples(200).size(1000);
    let result = simulate(&Newsletter, &opts, naive_estimate)?;
    println!(
        "Naive estimate over {} samples: mean {:.3}, bias {:.3}, rmse {:.3}",
        result.len(),
        result.mean(),
        result.bias(Newsletter::EFFECT),
        result.rmse(Newsletter::EFFECT),
    );

    // Same units, new assignments: the randomization distribution.
    let opts = opts.redraw(Redraw::Assignment);
    let result = simulate(&Newsletter, &opts, naive_estimate)?;
    println!(
        "Over {} assignments of the same units: mean {:.3}, std {:.3}",
        result.len(),
        result.mean(),
        result.std_dev(),
    );
    Ok(())
}

fn figures(dir: &Path) -> anyhow::Result<()> {
    let config = PlotConfig::default();
    HypothesisTest::default().save_svg(dir.join("hypothesis.svg"), &config)?;

    let ds = by_name("marketplace")?.generate_data(&GenerateOptions::default())?;
    io::write_dataset(dir.join("marketplace.csv"), &ds)?;
    let binscatter = Binscatter::default();
    let fit = binscatter.compute_dataset(&ds, "age", "sales")?;
    binscatter.save_svg(dir.join("binscatter.svg"), &fit, "age", "sales", &config)?;
    let by_online = binscatter
        .with_ci(0.95)
        .compute_dataset_by(&ds, "age", "sales", "online")?;
    let svg = binscatter.with_ci(0.95).to_svg(&by_online, "age", "sales", &config)?;
    std::fs::write(dir.join("binscatter_online.svg"), svg)?;

    let ds = by_name("store_coupons")?.generate_data(&GenerateOptions::default())?;
    let frames = RegressionAnimation::default().save_gif(
        dir.join("coupons.gif"),
        &ds.treatment()?,
        &ds.outcome()?,
        &config,
    )?;
    println!("Wrote {frames} frames");

    let ds = by_name("pretest")?.generate_data(&GenerateOptions::default().size(100))?;
    let frames = ProjectionAnimation::default().save_gif(
        dir.join("projection.gif"),
        &ds.f64_column("past_sales")?,
        &ds.outcome()?,
        &config,
    )?;
    println!("Wrote {frames} projection frames");

    Dag::iv("Y", "T", "Z", "U").write_dot(dir.join("iv.dot"))?;
    println!("Figures are in {}", dir.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    println!("------------------------------------------------------------------");
    for name in ["ad", "newsletter", "did", "gift", "cuped"] {
        show(name)?;
        println!("------------------------------------------------------------------");
    }

    println!("### monte carlo:");
    monte_carlo()?;
    println!("------------------------------------------------------------------");

    println!("### figures:");
    let dir = std::env::temp_dir().join("causal-dgp-demo");
    std::fs::create_dir_all(&dir)?;
    figures(&dir)?;
    println!("------------------------------------------------------------------");
    Ok(())
}
