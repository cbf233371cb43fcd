// Job Dependency Graph
// Validates `needs` references, detects cycles, tracks admission bookkeeping

use crate::error::{EngineError, EngineResult};
use crate::pipeline::models::{Job, Pipeline};
use std::collections::HashMap;

/// The directed graph induced by each job's `needs` list.
///
/// Built (and fully validated) before any step executes: a reference to an
/// unknown job or a dependency cycle rejects the whole definition.
#[derive(Debug, Clone)]
pub struct JobGraph {
    /// Job name -> names of jobs that depend on it.
    dependents: HashMap<String, Vec<String>>,
    /// Job name -> number of dependencies it waits on.
    dependency_counts: HashMap<String, usize>,
}

impl JobGraph {
    pub fn build(pipeline: &Pipeline) -> EngineResult<Self> {
        // Every `needs` entry must name another job in the same definition
        for (name, job) in &pipeline.jobs {
            for dep in &job.needs {
                if !pipeline.jobs.contains_key(dep) {
                    return Err(EngineError::UnknownDependency {
                        job: name.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }

        if let Some(participants) = detect_cycle(&pipeline.jobs) {
            return Err(EngineError::DependencyCycle { participants });
        }

        let mut dependents: HashMap<String, Vec<String>> = HashMap::new();
        let mut dependency_counts: HashMap<String, usize> = HashMap::new();

        for (name, job) in &pipeline.jobs {
            dependency_counts.insert(name.clone(), job.needs.len());
            dependents.entry(name.clone()).or_default();
            for dep in &job.needs {
                dependents.entry(dep.clone()).or_default().push(name.clone());
            }
        }

        Ok(Self {
            dependents,
            dependency_counts,
        })
    }

    /// Jobs with no dependencies, admissible immediately.
    pub fn roots(&self) -> Vec<String> {
        let mut roots: Vec<String> = self
            .dependency_counts
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(name, _)| name.clone())
            .collect();
        roots.sort();
        roots
    }

    pub fn dependents_of(&self, name: &str) -> &[String] {
        self.dependents.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn dependency_count(&self, name: &str) -> usize {
        self.dependency_counts.get(name).copied().unwrap_or(0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    Gray,
    Black,
}

/// Depth-first coloring walk; returns the participants of the first cycle
/// found, in walk order, with the entry node repeated at the end.
fn detect_cycle(jobs: &HashMap<String, Job>) -> Option<Vec<String>> {
    let mut colors: HashMap<&str, Color> = HashMap::new();
    let mut stack: Vec<&str> = Vec::new();

    let mut names: Vec<&str> = jobs.keys().map(String::as_str).collect();
    names.sort();

    for name in names {
        if !colors.contains_key(name) {
            if let Some(cycle) = visit(name, jobs, &mut colors, &mut stack) {
                return Some(cycle);
            }
        }
    }
    None
}

fn visit<'a>(
    name: &'a str,
    jobs: &'a HashMap<String, Job>,
    colors: &mut HashMap<&'a str, Color>,
    stack: &mut Vec<&'a str>,
) -> Option<Vec<String>> {
    colors.insert(name, Color::Gray);
    stack.push(name);

    if let Some(job) = jobs.get(name) {
        let mut needs: Vec<&str> = job.needs.iter().map(String::as_str).collect();
        needs.sort();

        for dep in needs {
            match colors.get(dep) {
                Some(Color::Gray) => {
                    // Back edge: everything from `dep` on the stack is in the cycle
                    let start = stack.iter().position(|n| *n == dep).unwrap_or(0);
                    let mut cycle: Vec<String> =
                        stack[start..].iter().map(|n| n.to_string()).collect();
                    cycle.push(dep.to_string());
                    return Some(cycle);
                }
                Some(Color::Black) => {}
                None => {
                    if let Some(cycle) = visit(dep, jobs, colors, stack) {
                        return Some(cycle);
                    }
                }
            }
        }
    }

    stack.pop();
    colors.insert(name, Color::Black);
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::parser::PipelineParser;

    fn pipeline(yaml: &str) -> Pipeline {
        PipelineParser::from_str(yaml).unwrap()
    }

    #[test]
    fn test_linear_chain() {
        let p = pipeline(
            r#"
name: chain
jobs:
  a:
    steps: [{name: s, run: "true"}]
  b:
    needs: [a]
    steps: [{name: s, run: "true"}]
  c:
    needs: [b]
    steps: [{name: s, run: "true"}]
"#,
        );
        let graph = JobGraph::build(&p).unwrap();
        assert_eq!(graph.roots(), vec!["a"]);
        assert_eq!(graph.dependents_of("a").to_vec(), vec!["b".to_string()]);
        assert_eq!(graph.dependency_count("c"), 1);
    }

    #[test]
    fn test_diamond_has_two_roots_after_fork() {
        let p = pipeline(
            r#"
name: diamond
jobs:
  build:
    steps: [{name: s, run: "true"}]
  lint:
    steps: [{name: s, run: "true"}]
  package:
    needs: [build, lint]
    steps: [{name: s, run: "true"}]
"#,
        );
        let graph = JobGraph::build(&p).unwrap();
        assert_eq!(graph.roots(), vec!["build", "lint"]);
        assert_eq!(graph.dependency_count("package"), 2);
    }

    #[test]
    fn test_unknown_dependency_is_rejected() {
        let p = pipeline(
            r#"
name: bad
jobs:
  deploy:
    needs: [nonexistent]
    steps: [{name: s, run: "true"}]
"#,
        );
        match JobGraph::build(&p) {
            Err(EngineError::UnknownDependency { job, dependency }) => {
                assert_eq!(job, "deploy");
                assert_eq!(dependency, "nonexistent");
            }
            other => panic!("expected UnknownDependency, got {:?}", other),
        }
    }

    #[test]
    fn test_two_job_cycle_is_rejected() {
        let p = pipeline(
            r#"
name: cyclic
jobs:
  a:
    needs: [b]
    steps: [{name: s, run: "true"}]
  b:
    needs: [a]
    steps: [{name: s, run: "true"}]
"#,
        );
        match JobGraph::build(&p) {
            Err(EngineError::DependencyCycle { participants }) => {
                assert!(participants.contains(&"a".to_string()));
                assert!(participants.contains(&"b".to_string()));
            }
            other => panic!("expected DependencyCycle, got {:?}", other),
        }
    }

    #[test]
    fn test_self_cycle_is_rejected() {
        let p = pipeline(
            r#"
name: selfish
jobs:
  a:
    needs: [a]
    steps: [{name: s, run: "true"}]
"#,
        );
        assert!(matches!(
            JobGraph::build(&p),
            Err(EngineError::DependencyCycle { .. })
        ));
    }
}
