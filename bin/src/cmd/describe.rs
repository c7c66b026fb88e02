//! Describe command implementation.

use anyhow::Result;
use ronda_frame::{Frame, Shape};

/// Print the shape, arity and columns of a frame.
pub(crate) fn describe(frame: &Frame) -> Result<()> {
    println!("shape:    {}", frame.tag());
    match frame.shape() {
        Shape::CrossSection { entity: Some(entity) } => println!("entity:   {}", entity),
        Shape::CrossSection { entity: None } => {}
        Shape::TimeSeries { time } => println!("time:     {}", time),
        Shape::Panel { time, entity } => {
            println!("time:     {}", time);
            println!("entity:   {}", entity);
        }
    }
    println!("arity:    {}", frame.dataset().arity());
    println!("rows:     {}", frame.len());
    if frame.tag() != ronda_frame::ShapeTag::CrossSection {
        println!("periods:  {}", frame.periods()?.len());
    }

    let values: Vec<String> = frame.value_columns().iter().map(|c| c.to_string()).collect();
    println!("values:   {}", values.join(", "));
    Ok(())
}
