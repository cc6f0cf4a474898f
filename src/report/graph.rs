//! Граф вычислений сети в формате Graphviz DOT

use std::fmt::Write;

use crate::models::network::{ChurnNetwork, LayerKind};

pub fn computational_graph_dot(network: &ChurnNetwork) -> String {
    let mut dot = String::new();
    let _ = writeln!(dot, "digraph \"{}\" {{", network.name);
    let _ = writeln!(dot, "    rankdir=TB;");
    let _ = writeln!(dot, "    node [shape=record, fontname=\"Helvetica\"];");

    let specs = network.layer_specs();
    for spec in &specs {
        let detail = match &spec.kind {
            LayerKind::Input => String::new(),
            LayerKind::Dense { activation } => format!(" | {}", activation.name()),
            LayerKind::Dropout { rate } => format!(" | rate={}", rate),
        };
        let _ = writeln!(
            dot,
            "    \"{name}\" [label=\"{{{name}: {kind}{detail} | {{input: (None, {i}) | output: (None, {o})}}}}\"];",
            name = spec.name,
            kind = spec.type_name(),
            detail = detail,
            i = spec.input_dim,
            o = spec.output_dim
        );
    }
    for pair in specs.windows(2) {
        let _ = writeln!(dot, "    \"{}\" -> \"{}\";", pair[0].name, pair[1].name);
    }
    dot.push_str("}\n");
    dot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::network::NetworkConfig;

    #[test]
    fn test_graph_chains_every_layer() {
        let network = ChurnNetwork::define(12, 0.2, NetworkConfig::default(), 42).unwrap();
        let dot = computational_graph_dot(&network);

        assert!(dot.starts_with("digraph \"customer_churn_model\""));
        assert_eq!(dot.matches(" -> ").count(), 7);
        assert!(dot.contains("\"churn_data\" -> \"hidden_1\""));
        assert!(dot.contains("\"dropout_3\" -> \"classification\""));
        assert!(dot.contains("input: (None, 12)"));
        assert!(dot.contains("rate=0.2"));
    }
}
