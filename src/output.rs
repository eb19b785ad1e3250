use std::collections::BTreeMap;

use console::style;
use num_format::{Locale, ToFormattedString};

use crate::core::{FileEntry, OutputFormat, PackOutput, TokenEstimates};

/// Trie of path segments stored in an arena. Node 0 is the unnamed root.
#[derive(Debug, Default)]
pub struct PathTree {
    nodes: Vec<PathNode>,
}

#[derive(Debug, Default)]
struct PathNode {
    children: BTreeMap<String, usize>,
}

impl PathTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![PathNode::default()],
        }
    }

    pub fn from_entries(entries: &[FileEntry]) -> Self {
        let mut tree = Self::new();
        for entry in entries {
            tree.insert(&entry.path);
        }
        tree
    }

    pub fn insert(&mut self, path: &str) {
        let mut current = 0;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = match self.nodes[current].children.get(segment) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(PathNode::default());
                    self.nodes[current]
                        .children
                        .insert(segment.to_string(), child);
                    child
                }
            };
        }
    }

    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        self.render_node(0, "", &mut lines);
        lines.join("\n")
    }

    fn render_node(&self, node: usize, prefix: &str, lines: &mut Vec<String>) {
        let children = &self.nodes[node].children;
        let last = children.len().saturating_sub(1);

        for (index, (name, &child)) in children.iter().enumerate() {
            let (connector, extension) = if index == last {
                ("└── ", "    ")
            } else {
                ("├── ", "│   ")
            };
            lines.push(format!("{prefix}{connector}{name}"));

            if !self.nodes[child].children.is_empty() {
                self.render_node(child, &format!("{prefix}{extension}"), lines);
            }
        }
    }
}

pub fn render_tree(entries: &[FileEntry]) -> String {
    PathTree::from_entries(entries).render()
}

pub fn aggregate_contents(entries: &[FileEntry]) -> String {
    let mut contents = String::new();
    for entry in entries {
        contents.push_str("====== File: ");
        contents.push_str(&entry.path);
        contents.push_str(" ======\n");
        contents.push_str(&entry.content);
        contents.push_str("\n\n");
    }
    contents
}

pub fn generate_output(output: &PackOutput, format: OutputFormat) -> String {
    match format {
        OutputFormat::Tree => output.directory_structure.clone(),
        OutputFormat::Files => output.repo_contents.clone(),
        OutputFormat::Both => format!(
            "Directory Structure:\n\n{}\n\nFile Contents:\n\n{}",
            output.directory_structure, output.repo_contents
        ),
    }
}

pub fn display_token_counts(file_count: usize, estimates: &TokenEstimates) {
    eprintln!("\n{}", style("Summary:").green().bold());
    eprintln!("Total files: {}", file_count.to_formatted_string(&Locale::en));
    eprintln!(
        "Directory tokens: {}",
        estimates.directory_tokens.to_formatted_string(&Locale::en)
    );
    eprintln!(
        "Content tokens: {}",
        estimates.content_tokens.to_formatted_string(&Locale::en)
    );
    eprintln!(
        "Total tokens: {}",
        style(estimates.total().to_formatted_string(&Locale::en)).bold()
    );
}
