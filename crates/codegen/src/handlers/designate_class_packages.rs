use super::ContainerHandler;
use crate::config::StructureStyle;
use crate::container::ClassContainer;
use crate::models::ClassId;
use crate::namespaces;
use crate::text;
use crate::Result;

/// Module of classes without a namespace under the namespaces style.
const DEFAULT_MODULE: &str = "types";

/// Assign the package and module every class is rendered into.
///
/// Inner classes always share the package and module of their outer class.
#[derive(Debug)]
pub struct DesignateClassPackages;

impl ContainerHandler for DesignateClassPackages {
    fn run(&self, container: &mut ClassContainer) -> Result<()> {
        let output = &container.config().output;
        let base: Vec<String> = output.package.split('.').map(str::to_string).collect();
        let style = output.structure_style;

        match style {
            StructureStyle::Filenames => group_by_filenames(container, &base),
            StructureStyle::Namespaces => group_by_namespace(container, &base),
            StructureStyle::SinglePackage => group_all_together(container, &base),
        }
        Ok(())
    }
}

fn group_by_filenames(container: &mut ClassContainer, base: &[String]) {
    let ids = container.ids();
    let directories: Vec<Vec<&str>> = ids
        .iter()
        .map(|id| directory(&container.class(*id).location))
        .collect();
    let common = common_prefix(&directories);

    let assignments: Vec<(ClassId, String, String)> = ids
        .iter()
        .zip(&directories)
        .map(|(id, dirs)| {
            let location = &container.class(*id).location;
            let package = base
                .iter()
                .cloned()
                .chain(dirs[common..].iter().map(|dir| text::module_name(dir)))
                .collect::<Vec<_>>()
                .join(".");
            (*id, package, text::module_name(file_stem(location)))
        })
        .collect();

    for (id, package, module) in assignments {
        assign(container, id, &package, &module);
    }
}

fn group_by_namespace(container: &mut ClassContainer, base: &[String]) {
    for id in container.ids() {
        let segments: Vec<String> = container
            .class(id)
            .target_namespace()
            .map(namespaces::uri_segments)
            .unwrap_or_default()
            .iter()
            .map(|segment| text::module_name(segment))
            .collect();

        let (package, module) = match segments.split_last() {
            Some((module, parents)) => {
                let package = base.iter().chain(parents).cloned().collect::<Vec<_>>().join(".");
                (package, module.clone())
            }
            None => (base.join("."), DEFAULT_MODULE.to_string()),
        };
        assign(container, id, &package, &module);
    }
}

fn group_all_together(container: &mut ClassContainer, base: &[String]) {
    let package = base.join(".");
    let module = base
        .last()
        .map(|segment| text::module_name(segment))
        .unwrap_or_else(|| DEFAULT_MODULE.to_string());

    for id in container.ids() {
        assign(container, id, &package, &module);
    }
}

fn assign(container: &mut ClassContainer, id: ClassId, package: &str, module: &str) {
    for class in container.walk(id) {
        let class = container.class_mut(class);
        class.package = Some(package.to_string());
        class.module = Some(module.to_string());
    }
}

/// Directory segments of a location, scheme and file name excluded.
fn directory(location: &str) -> Vec<&str> {
    let path = location.split_once("://").map_or(location, |(_, rest)| rest);
    let mut segments: Vec<&str> = path
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();
    segments.pop();
    segments
}

fn file_stem(location: &str) -> &str {
    let name = location.rsplit(['/', '\\']).next().unwrap_or(location);
    name.rsplit_once('.').map_or(name, |(stem, _)| stem)
}

fn common_prefix(paths: &[Vec<&str>]) -> usize {
    let Some((first, rest)) = paths.split_first() else {
        return 0;
    };
    (0..first.len())
        .take_while(|&index| rest.iter().all(|path| path.get(index) == first.get(index)))
        .count()
}
