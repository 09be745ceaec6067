use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    name: String,
    #[serde(default)]
    interfaces: Vec<String>,
    #[serde(default)]
    libraries: Vec<String>,
    #[serde(default)]
    folders: Vec<String>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            interfaces: Vec::new(),
            libraries: Vec::new(),
            folders: Vec::new(),
        }
    }

    pub fn with_interfaces<I, S>(mut self, interfaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interfaces.extend(interfaces.into_iter().map(Into::into));
        self
    }

    pub fn with_libraries<I, S>(mut self, libraries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.libraries.extend(libraries.into_iter().map(Into::into));
        self
    }

    pub fn with_folders<I, S>(mut self, folders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.folders.extend(folders.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    pub fn libraries(&self) -> &[String] {
        &self.libraries
    }

    pub fn folders(&self) -> &[String] {
        &self.folders
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty() && self.libraries.is_empty() && self.folders.is_empty()
    }
}

pub fn builtin_sections() -> Vec<Section> {
    vec![
        audio_extensions(),
        ant(),
        cas(),
        dolby(),
        fingerprint(),
        health(),
    ]
}

fn audio_extensions() -> Section {
    Section::new("Audio extensions").with_interfaces([
        "vendor.qti.hardware.audiohalext",
        "vendor.qti.hardware.AGMIPC",
        "vendor.qti.hardware.pal",
    ])
}

fn ant() -> Section {
    Section::new("ANT").with_interfaces(["com.dsi.ant", "vendor.xiaomi.hardware.antdtx"])
}

fn cas() -> Section {
    Section::new("CAS").with_interfaces(["android.hardware.cas"])
}

fn dolby() -> Section {
    Section::new("Dolby")
        .with_interfaces(["vendor.dolby.hardware.dms"])
        .with_libraries(["libdapparamstorage", "libdeccfg"])
        .with_folders(["etc/dolby"])
}

fn fingerprint() -> Section {
    Section::new("Fingerprint").with_interfaces([
        "android.hardware.biometrics.fingerprint",
        "vendor.goodix.hardware.biometrics.fingerprint",
        "vendor.fpc.hardware.biometrics.fingerprint",
    ])
}

fn health() -> Section {
    Section::new("Health").with_interfaces(["android.hardware.health"])
}
