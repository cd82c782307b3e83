//! Graph slot names for a given layer count.

use anyhow::Result;

use kjarni_export::GraphSignature;

pub fn render(signature: &GraphSignature) -> String {
    let mut out = String::from("inputs:\n");
    for name in &signature.inputs {
        out.push_str(&format!("  {}\n", name));
    }
    out.push_str("outputs:\n");
    for name in &signature.outputs {
        out.push_str(&format!("  {}\n", name));
    }
    out
}

pub fn run(layers: usize, encoder: bool) -> Result<()> {
    let signature = if encoder {
        GraphSignature::for_encoder(layers)
    } else {
        GraphSignature::for_decoder(layers)
    };
    print!("{}", render(&signature));
    Ok(())
}
