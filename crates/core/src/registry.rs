use crate::model::Blob;
use crate::section::{builtin_sections, Section};

#[derive(Debug, Clone, Default)]
pub struct SectionRegistry {
    sections: Vec<Section>,
}

#[derive(Debug, Default)]
pub struct SectionRegistryBuilder {
    sections: Vec<Section>,
}

impl SectionRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtin_sections() -> Self {
        let mut builder = Self::new();
        for section in builtin_sections() {
            builder.register(section);
        }
        builder
    }

    pub fn register(&mut self, section: Section) -> &mut Self {
        self.sections.push(section);
        self
    }

    pub fn build(self) -> SectionRegistry {
        SectionRegistry {
            sections: self.sections,
        }
    }
}

impl SectionRegistry {
    pub fn builder() -> SectionRegistryBuilder {
        SectionRegistryBuilder::new()
    }

    pub fn builtin() -> Self {
        SectionRegistryBuilder::with_builtin_sections().build()
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn get(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.name() == name)
    }

    pub fn classify(&self, blob: &Blob) -> Option<&Section> {
        self.position_of(blob).map(|index| &self.sections[index])
    }

    pub fn position_of(&self, blob: &Blob) -> Option<usize> {
        self.sections
            .iter()
            .position(|section| section_matches(section, blob))
    }

    pub fn index_of(&self, section: &Section) -> Option<usize> {
        self.sections
            .iter()
            .position(|registered| std::ptr::eq(registered, section))
    }
}

pub fn section_matches(section: &Section, blob: &Blob) -> bool {
    matches_folder(section, blob)
        || matches_library(section, blob)
        || matches_interface(section, blob)
}

fn matches_folder(section: &Section, blob: &Blob) -> bool {
    blob.ancestors()
        .iter()
        .any(|ancestor| section.folders().iter().any(|folder| folder == ancestor))
}

fn matches_library(section: &Section, blob: &Blob) -> bool {
    blob.extension() == "so"
        && section
            .libraries()
            .iter()
            .any(|library| library == blob.stem())
}

fn matches_interface(section: &Section, blob: &Blob) -> bool {
    if section.interfaces().is_empty() {
        return false;
    }
    interface_candidates(blob).any(|candidate| {
        section
            .interfaces()
            .iter()
            .any(|interface| is_same_or_child(candidate, interface))
    })
}

// Package prefix before `@version` or `-suffix`, one per path component.
pub fn interface_candidates(blob: &Blob) -> impl Iterator<Item = &str> {
    let mut components = blob.components().collect::<Vec<_>>();
    components.pop();

    let basename = blob.basename();
    let file_name = match basename.find(['@', '-']) {
        Some(end) => &basename[..end],
        None => blob.stem(),
    };

    components
        .into_iter()
        .map(package_prefix)
        .chain(std::iter::once(file_name))
        .filter(|name| name.contains('.'))
}

fn package_prefix(component: &str) -> &str {
    match component.find(['@', '-']) {
        Some(end) => &component[..end],
        None => component,
    }
}

fn is_same_or_child(candidate: &str, interface: &str) -> bool {
    candidate
        .strip_prefix(interface)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::{interface_candidates, SectionRegistry, SectionRegistryBuilder};
    use crate::model::Blob;
    use crate::section::Section;

    fn section_of(path: &str) -> Option<String> {
        SectionRegistry::builtin()
            .classify(&Blob::new(path))
            .map(|section| section.name().to_string())
    }

    #[test]
    fn derives_interface_names_from_hidl_and_aidl_artifacts() {
        let candidates = |path: &str| {
            let blob = Blob::new(path);
            let names = interface_candidates(&blob)
                .map(str::to_string)
                .collect::<Vec<_>>();
            names
        };

        assert_eq!(
            candidates("lib64/vendor.dolby.hardware.dms@2.0-impl.so"),
            ["vendor.dolby.hardware.dms"]
        );
        assert_eq!(
            candidates("lib64/android.hardware.health-V1-ndk.so"),
            ["android.hardware.health"]
        );
        assert_eq!(
            candidates("framework/com.dsi.ant.antradio_library.jar"),
            ["com.dsi.ant.antradio_library"]
        );
        assert_eq!(
            candidates("app/vendor.xiaomi.hardware.antdtx@1.0/Foo.apk"),
            ["vendor.xiaomi.hardware.antdtx"]
        );
        assert!(candidates("lib64/libfoo.so").is_empty());
    }

    #[test]
    fn matches_interfaces_by_dotted_prefix() {
        assert_eq!(
            section_of("bin/hw/android.hardware.health@2.1-service"),
            Some("Health".to_string())
        );
        assert_eq!(
            section_of("etc/init/android.hardware.cas@1.2-service.rc"),
            Some("CAS".to_string())
        );
        assert_eq!(
            section_of("lib64/hw/android.hardware.health.storage@1.0-impl.so"),
            Some("Health".to_string())
        );
        assert_eq!(section_of("bin/hw/android.hardware.healthx-service"), None);
        assert_eq!(
            section_of("framework/com.dsi.ant.antradio_library.jar"),
            Some("ANT".to_string())
        );
    }

    #[test]
    fn matches_libraries_and_folders() {
        assert_eq!(
            section_of("lib64/libdapparamstorage.so"),
            Some("Dolby".to_string())
        );
        assert_eq!(section_of("etc/dolby/dax-default.xml"), Some("Dolby".to_string()));
        assert_eq!(section_of("etc/dolby_extra/dax.xml"), None);
        assert_eq!(section_of("etc/libdeccfg.conf"), None);
        assert_eq!(section_of("lib64/libfoo.so"), None);
    }

    #[test]
    fn first_registered_section_wins() {
        let mut builder = SectionRegistryBuilder::new();
        builder
            .register(Section::new("First").with_folders(["etc/shared"]))
            .register(Section::new("Second").with_folders(["etc/shared"]));
        let registry = builder.build();

        let blob = Blob::new("etc/shared/config.xml");
        assert_eq!(
            registry.classify(&blob).map(|section| section.name()),
            Some("First")
        );
    }

    #[test]
    fn duplicate_names_keep_distinct_positions() {
        let mut builder = SectionRegistryBuilder::new();
        builder
            .register(Section::new("Audio").with_folders(["etc/acdbdata"]))
            .register(Section::new("Camera").with_folders(["etc/camera"]))
            .register(Section::new("Audio").with_folders(["etc/audio"]));
        let registry = builder.build();

        assert_eq!(registry.position_of(&Blob::new("etc/acdbdata/a.acdb")), Some(0));
        assert_eq!(registry.position_of(&Blob::new("etc/audio/b.xml")), Some(2));
        let section = registry
            .classify(&Blob::new("etc/audio/b.xml"))
            .expect("section matches");
        assert_eq!(registry.index_of(section), Some(2));
        assert_eq!(registry.index_of(&Section::new("Audio")), None);
    }

    #[test]
    fn empty_sections_never_match() {
        let mut builder = SectionRegistry::builder();
        builder.register(Section::new("Nothing"));
        let registry = builder.build();
        assert!(registry.classify(&Blob::new("etc/a.xml")).is_none());
        assert!(registry.classify(&Blob::new("lib64/libfoo.so")).is_none());
    }

    #[test]
    fn looks_sections_up_by_name() {
        let registry = SectionRegistry::builtin();
        assert!(registry.get("Dolby").is_some());
        assert!(registry.get("Camera").is_none());
        assert_eq!(registry.sections().len(), 6);
    }
}
