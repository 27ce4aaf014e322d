// Copyright 2022 CeresDB Project Authors. Licensed under Apache-2.0.

//! Causal graphs as Graphviz DOT documents.

use std::{fmt, path::Path};

use tracing::debug;

use crate::errors::Result;

/// A directed graph with optional groups of nodes drawn at the same rank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dag {
    edges: Vec<(String, String)>,
    ranks: Vec<Vec<String>>,
}

impl Dag {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.push((from.into(), to.into()));
        self
    }

    /// Ask the layout to put `nodes` on one row.
    #[must_use]
    pub fn same_rank<S: Into<String>>(mut self, nodes: impl IntoIterator<Item = S>) -> Self {
        self.ranks.push(nodes.into_iter().map(Into::into).collect());
        self
    }

    pub fn edges(&self) -> &[(String, String)] {
        &self.edges
    }

    /// Nodes in order of first appearance.
    pub fn nodes(&self) -> Vec<&str> {
        let mut nodes: Vec<&str> = Vec::new();
        let names = self
            .edges
            .iter()
            .flat_map(|(a, b)| [a.as_str(), b.as_str()])
            .chain(self.ranks.iter().flatten().map(String::as_str));
        for name in names {
            if !nodes.contains(&name) {
                nodes.push(name);
            }
        }
        nodes
    }

    /// Instrumental variables: `z` moves `t`, which moves `y`, and an
    /// unobserved `u` confounds `t` and `y`.
    pub fn iv(y: &str, t: &str, z: &str, u: &str) -> Self {
        Dag::new()
            .edge(z, t)
            .edge(u, y)
            .edge(u, t)
            .edge(t, y)
            .same_rank([t, z, y])
    }

    pub fn to_dot(&self) -> String {
        self.to_string()
    }

    pub fn write_dot(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_dot())?;
        debug!(path = %path.display(), edges = self.edges.len(), "Wrote dag");
        Ok(())
    }
}

/// Quote a node id unless it is a plain identifier or number.
fn quote(id: &str) -> String {
    let plain = !id.is_empty()
        && !id.starts_with(|c: char| c.is_ascii_digit())
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    let numeral = id.parse::<f64>().is_ok()
        && id
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == '-');
    if plain || numeral {
        id.to_string()
    } else {
        format!("\"{}\"", id.replace('"', "\\\""))
    }
}

impl fmt::Display for Dag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph {{")?;
        for (from, to) in &self.edges {
            writeln!(f, "\t{} -> {}", quote(from), quote(to))?;
        }
        for (i, rank) in self.ranks.iter().enumerate() {
            let name = if i == 0 {
                "child".to_string()
            } else {
                format!("child_{i}")
            };
            writeln!(f, "\tsubgraph {name} {{")?;
            writeln!(f, "\t\trank=same")?;
            for node in rank {
                writeln!(f, "\t\t{}", quote(node))?;
            }
            writeln!(f, "\t}}")?;
        }
        writeln!(f, "}}")
    }
}

#[cfg(test)]
mod test {
    use super::{quote, Dag};

    #[test]
    fn test_iv_dag() {
        let dag = Dag::iv("Y", "T", "Z", "U");
        let expected = "digraph {\n\
            \tZ -> T\n\
            \tU -> Y\n\
            \tU -> T\n\
            \tT -> Y\n\
            \tsubgraph child {\n\
            \t\trank=same\n\
            \t\tT\n\
            \t\tZ\n\
            \t\tY\n\
            \t}\n\
            }\n";
        assert_eq!(expected, dag.to_dot());
        assert_eq!(vec!["Z", "T", "U", "Y"], dag.nodes());
        assert_eq!(4, dag.edges().len());
    }

    #[test]
    fn test_quoted_names() {
        assert_eq!("income", quote("income"));
        assert_eq!("\"became member\"", quote("became member"));
        assert_eq!("\"2x\"", quote("2x"));
        assert_eq!("3.5", quote("3.5"));

        let dag = Dag::iv("revenue", "newsletter", "reminder", "hidden income");
        assert!(dag.to_dot().contains("\t\"hidden income\" -> revenue\n"));
    }

    #[test]
    fn test_write_dot() {
        let path = crate::io::test::temp_path("iv.dot");
        Dag::iv("Y", "T", "Z", "U").write_dot(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("digraph {"));
        std::fs::remove_file(&path).unwrap();
    }
}
