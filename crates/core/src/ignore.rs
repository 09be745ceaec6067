use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Blob, IgnoreRule};

pub const IGNORE_BINARIES: &[&str] = &[
    "acpi",
    "awk",
    "base64",
    "basename",
    "blockdev",
    "btconfig",
    "cal",
    "cat",
    "chcon",
    "chgrp",
    "chmod",
    "chown",
    "chroot",
    "chrt",
    "cksum",
    "clear",
    "cmp",
    "comm",
    "cp",
    "cpio",
    "cut",
    "date",
    "dd",
    "df",
    "diff",
    "dirname",
    "dmesg",
    "dos2unix",
    "du",
    "echo",
    "egrep",
    "env",
    "expand",
    "expr",
    "fallocate",
    "false",
    "fgrep",
    "file",
    "find",
    "flock",
    "fmt",
    "free",
    "getenforce",
    "getevent",
    "getprop",
    "grep",
    "groups",
    "gunzip",
    "gzip",
    "head",
    "hostapd_cli",
    "hostname",
    "hwclock",
    "id",
    "ifconfig",
    "inotifyd",
    "insmod",
    "ionice",
    "iorenice",
    "ipacm",
    "kill",
    "killall",
    "ln",
    "load_policy",
    "log",
    "logname",
    "logwrapper",
    "losetup",
    "ls",
    "lsmod",
    "lsof",
    "lspci",
    "lsusb",
    "md5sum",
    "microcom",
    "mkdir",
    "mkfifo",
    "mknod",
    "mkswap",
    "mktemp",
    "modinfo",
    "modprobe",
    "more",
    "mount",
    "mountpoint",
    "mv",
    "netstat",
    "newfs_msdos",
    "nice",
    "nl",
    "nohup",
    "od",
    "paste",
    "patch",
    "pgrep",
    "pidof",
    "pkill",
    "pmap",
    "printenv",
    "printf",
    "ps",
    "pwd",
    "readlink",
    "realpath",
    "renice",
    "restorecon",
    "rm",
    "rmdir",
    "rmmod",
    "runcon",
    "sed",
    "sendevent",
    "seq",
    "setenforce",
    "setprop",
    "setsid",
    "sh",
    "sha1sum",
    "sha224sum",
    "sha256sum",
    "sha384sum",
    "sha512sum",
    "sleep",
    "sort",
    "split",
    "start",
    "stat",
    "stop",
    "strings",
    "stty",
    "swapoff",
    "swapon",
    "sync",
    "sysctl",
    "tac",
    "tail",
    "tar",
    "taskset",
    "tee",
    "time",
    "timeout",
    "toolbox",
    "top",
    "touch",
    "toybox_vendor",
    "tr",
    "true",
    "truncate",
    "tty",
    "ulimit",
    "umount",
    "uname",
    "uniq",
    "unix2dos",
    "uptime",
    "usleep",
    "uudecode",
    "uuencode",
    "vmstat",
    "vndservice",
    "vndservicemanager",
    "wc",
    "which",
    "whoami",
    "wpa_cli",
    "xargs",
    "xxd",
    "yes",
    "zcat",
];

pub const IGNORE_SHARED_LIBS: &[&str] = &[
    "audio.a2dp.default.so",
    "hidl.tests.vendor@1.0.so",
    "hidl.tests.vendor@1.1.so",
    "ld-android.so",
    "libaacextractor.so",
    "libaaudioservice.so",
    "libaaudio.so",
    "libadbconnectiond.so",
    "libadbconnection.so",
    "libadf.so",
    "libamrextractor.so",
    "libandroidfw.so",
    "libandroid_net.so",
    "libandroid_runtime.so",
    "libandroid_servers.so",
    "libandroid.so",
    "libappfuse.so",
    "libart-compiler.so",
    "libartd-compiler.so",
    "libartd-dexlayout.so",
    "libart-dexlayout.so",
    "libart-disassembler.so",
    "libartd.so",
    "libart.so",
    "libasyncio.so",
    "libaudioclient.so",
    "libaudioeffect_jni.so",
    "libaudioflinger.so",
    "libaudiohal@2.0.so",
    "libaudiohal_deathhandler.so",
    "libaudiohal.so",
    "libaudiomanager.so",
    "libaudiopolicyenginedefault.so",
    "libaudiopolicymanagerdefault.so",
    "libaudiopolicymanager.so",
    "libaudiopolicyservice.so",
    "libaudiopreprocessing.so",
    "libaudioprocessing.so",
    "libaudioroute.so",
    "libaudiospdif.so",
    "libaudioutils.so",
    "libavservices_minijail.so",
    "libavservices_minijail_vendor.so",
    "libbacktrace.so",
    "libbase.so",
    "libbcc.so",
    "libbcinfo.so",
    "libbinder_ndk.so",
    "libbinder.so",
    "libbinderthreadstate.so",
    "libbinderwrapper.so",
    "libblas.so",
    "libbluetooth-binder.so",
    "libbluetooth_jni.so",
    "libbluetooth.so",
    "libbootanimation.so",
    "libbrillo-binder.so",
    "libbrillo.so",
    "libbrillo-stream.so",
    "libbrotli.so",
    "libbufferhubqueue.so",
    "libbufferhub.so",
    "libbundlewrapper.so",
    "libbz.so",
    "libcamera2ndk.so",
    "libcamera_client.so",
    "libcamera_metadata.so",
    "libcameraservice.so",
    "libcap.so",
    "libcgrouprc.so",
    "libchrome.so",
    "libclang_rt.asan-aarch64-android.so",
    "libclang_rt.asan-arm-android.so",
    "libclang_rt.asan-i686-android.so",
    "libclang_rt.asan-mips64-android.so",
    "libclang_rt.asan-mips-android.so",
    "libclang_rt.asan-x86_64-android.so",
    "libclang_rt.hwasan-aarch64-android.so",
    "libclang_rt.scudo-aarch64-android.so",
    "libclang_rt.scudo-arm-android.so",
    "libclang_rt.scudo-i686-android.so",
    "libclang_rt.scudo_minimal-aarch64-android.so",
    "libclang_rt.scudo_minimal-arm-android.so",
    "libclang_rt.scudo_minimal-i686-android.so",
    "libclang_rt.scudo_minimal-x86_64-android.so",
    "libclang_rt.scudo-x86_64-android.so",
    "libclang_rt.ubsan_standalone-aarch64-android.so",
    "libclang_rt.ubsan_standalone-arm-android.so",
    "libclang_rt.ubsan_standalone-i686-android.so",
    "libclang_rt.ubsan_standalone-x86_64-android.so",
    "libcld80211.so",
    "libc_malloc_debug.so",
    "libcn-cbor.so",
    "libcodec2_hidl@1.0.so",
    "libcodec2.so",
    "libcodec2_vndk.so",
    "libcompiler_rt.so",
    "libcrypto.so",
    "libcrypto_utils.so",
    "libc++_shared.so",
    "libc++.so",
    "libc.so",
    "libcups.so",
    "libcurl.so",
    "libcutils.so",
    "libdebuggerd_client.so",
    "libdefcontainer_jni.so",
    "libdexfile.so",
    "libdiskconfig.so",
    "libdisplayservicehidl.so",
    "libdl_android.so",
    "libdl.so",
    "libdng_sdk.so",
    "libdownmix.so",
    "libdrmframework_jni.so",
    "libdrmframework.so",
    "libdrm.so",
    "libdt_fd_forward.so",
    "libdt_socket.so",
    "libdumpstateaidl.so",
    "libdumpstateutil.so",
    "libeffectproxy.so",
    "libeffectsconfig.so",
    "libeffects.so",
    "libEGL.so",
    "libETC1.so",
    "libevent.so",
    "libexif.so",
    "libexpat.so",
    "libext2_blkid.so",
    "libext2_com_err.so",
    "libext2_e2p.so",
    "libext2fs.so",
    "libext2_misc.so",
    "libext2_quota.so",
    "libext2_uuid.so",
    "libext4_utils.so",
    "libf2fs_sparseblock.so",
    "libFFTEm.so",
    "libfilterfw.so",
    "libfilterpack_imageproc.so",
    "libflacextractor.so",
    "libfmq.so",
    "libframesequence.so",
    "libft2.so",
    "libfwdlockengine.so",
    "libgatekeeper.so",
    "libgiftranscode.so",
    "libGLESv1_CM.so",
    "libGLESv2.so",
    "libGLESv3.so",
    "libgraphicsenv.so",
    "libgtest_prod.so",
    "libgui_vendor.so",
    "libgui.so",
    "libhardware_legacy.so",
    "libhardware.so",
    "libharfbuzz_ng.so",
    "libheif.so",
    "libhidcommand_jni.so",
    "libhidlallocatorutils.so",
    "libhidlbase.so",
    "libhidlcache.so",
    "libhidl-gen-hash.so",
    "libhidl-gen-utils.so",
    "libhidlmemory.so",
    "libhidltransport.so",
    "libhwbinder_noltopgo.so",
    "libhwbinder.so",
    "libhwc2on1adapter.so",
    "libhwui.so",
    "libicui18n.so",
    "libicuuc.so",
    "libimg_utils.so",
    "libincident.so",
    "libinputflinger.so",
    "libinputservice.so",
    "libinput.so",
    "libion.so",
    "libiprouteutil.so",
    "libjavacore.so",
    "libjavacrypto.so",
    "libjdwp.so",
    "libjnigraphics.so",
    "libjni_pacprocessor.so",
    "libjpeg.so",
    "libjsoncpp.so",
    "libkeymaster4support.so",
    "libkeymaster_messages.so",
    "libkeymaster_portable.so",
    "libkeystore_aidl.so",
    "libkeystore_binder.so",
    "libkeystore-engine.so",
    "libkeystore_parcelables.so",
    "libkeyutils.so",
    "liblayers_proto.so",
    "libldacBT_abr.so",
    "libldacBT_enc.so",
    "libldnhncr.so",
    "libLLVM_android.so",
    "liblog.so",
    "liblogwrap.so",
    "liblshal.so",
    "liblz4.so",
    "liblzma.so",
    "libmdnssd.so",
    "libmediadrm.so",
    "libmediaextractorservice.so",
    "libmedia_helper.so",
    "libmedia_jni.so",
    "libmedialogservice.so",
    "libmediametrics.so",
    "libmediandk.so",
    "libmedia_omx.so",
    "libmediaplayerservice.so",
    "libmedia.so",
    "libmediautils.so",
    "libmemtrack.so",
    "libmemunreachable.so",
    "libmetricslogger.so",
    "libmidiextractor.so",
    "libminijail.so",
    "libminikin.so",
    "libmkbootimg_abi_check.so",
    "libmkvextractor.so",
    "libmp3extractor.so",
    "libmp4extractor.so",
    "libmpeg2extractor.so",
    "libm.so",
    "libmtp.so",
    "libnativehelper.so",
    "libnativewindow.so",
    "libnbaio_mono.so",
    "libnbaio.so",
    "libnblog.so",
    "libnetd_client.so",
    "libnetdutils.so",
    "libnetlink.so",
    "libnetutils.so",
    "libneuralnetworks.so",
    "libnfc_nci_jni.so",
    "libnfc-nci.so",
    "libnl.so",
    "libnpt.so",
    "liboggextractor.so",
    "libopenjdkd.so",
    "libopenjdkjvmd.so",
    "libopenjdkjvm.so",
    "libopenjdkjvmtid.so",
    "libopenjdkjvmti.so",
    "libopenjdk.so",
    "libOpenMAXAL.so",
    "libOpenSLES.so",
    "libopus.so",
    "libpackagelistparser.so",
    "libpagemap.so",
    "libpcap.so",
    "libpcre2.so",
    "libpcrecpp.so",
    "libpdfium.so",
    "libpdx_default_transport.so",
    "libpiex.so",
    "libpixelflinger.so",
    "libpng.so",
    "libpowermanager.so",
    "libpower.so",
    "libprintspooler_jni.so",
    "libprocessgroup.so",
    "libprocinfo.so",
    "libprotoutil.so",
    "libpuresoftkeymasterdevice.so",
    "libqtaguid.so",
    "libradio_metadata.so",
    "libreference-ril.so",
    "libresourcemanagerservice.so",
    "libreverbwrapper.so",
    "libril.so",
    "librilutils.so",
    "libRSCacheDir.so",
    "libRScpp.so",
    "libRSCpuRef.so",
    "libRSDriver.so",
    "libRS_internal.so",
    "librs_jni.so",
    "libRS.so",
    "librtp_jni.so",
    "libschedulerservicehidl.so",
    "libselinux.so",
    "libsensorservicehidl.so",
    "libsensorservice.so",
    "libsensor.so",
    "libsepol.so",
    "libservices.so",
    "libsigchain.so",
    "libsoftkeymasterdevice.so",
    "libsonic.so",
    "libsonivox.so",
    "libsoundpool.so",
    "libsoundtriggerservice.so",
    "libsoundtrigger.so",
    "libsparse.so",
    "libspeexresampler.so",
    "libsqlite.so",
    "libssl.so",
    "libstagefright_amrnb_common.so",
    "libstagefright_bufferpool@2.0.so",
    "libstagefright_bufferqueue_helper.so",
    "libstagefright_enc_common.so",
    "libstagefright_flacdec.so",
    "libstagefright_foundation.so",
    "libstagefright_httplive.so",
    "libstagefright_http_support.so",
    "libstagefright_omx.so",
    "libstagefright_omx_utils.so",
    "libstagefright.so",
    "libstagefright_soft_aacdec.so",
    "libstagefright_soft_aacenc.so",
    "libstagefright_soft_amrdec.so",
    "libstagefright_soft_amrnbenc.so",
    "libstagefright_soft_amrwbenc.so",
    "libstagefright_soft_avcdec.so",
    "libstagefright_soft_avcenc.so",
    "libstagefright_soft_flacdec.so",
    "libstagefright_soft_flacenc.so",
    "libstagefright_soft_g711dec.so",
    "libstagefright_soft_gsmdec.so",
    "libstagefright_soft_hevcdec.so",
    "libstagefright_soft_mp3dec.so",
    "libstagefright_soft_mpeg2dec.so",
    "libstagefright_soft_mpeg4dec.so",
    "libstagefright_soft_mpeg4enc.so",
    "libstagefright_softomx.so",
    "libstagefright_soft_opusdec.so",
    "libstagefright_soft_rawdec.so",
    "libstagefright_soft_vorbisdec.so",
    "libstagefright_soft_vpxdec.so",
    "libstagefright_soft_vpxenc.so",
    "libstagefright_xmlparser.so",
    "libstatslog.so",
    "libstdc++.so",
    "libsurfaceflinger.so",
    "libsuspend.so",
    "libsync.so",
    "libsysutils.so",
    "libtextclassifier_hash.so",
    "libtextclassifier.so",
    "libtinyalsa.so",
    "libtinycompress.so",
    "libtinyxml2.so",
    "libtombstoned_client.so",
    "libui.so",
    "libunwind.so",
    "libunwindstack.so",
    "libusbhost.so",
    "libutilscallstack.so",
    "libutils.so",
    "libvintf.so",
    "libvisualizer.so",
    "libvixl-arm64.so",
    "libvixl-arm.so",
    "libvndksupport.so",
    "libvorbisidec.so",
    "libvulkan.so",
    "libwavextractor.so",
    "libwebrtc_audio_preprocessing.so",
    "libwebviewchromium_loader.so",
    "libwebviewchromium_plat_support.so",
    "libwfds.so",
    "libwifikeystorehal.so",
    "libwifi-service.so",
    "libwifi-system-iface.so",
    "libwifi-system.so",
    "libwilhelm.so",
    "libxml2.so",
    "libyuv.so",
    "libziparchive.so",
    "libz.so",
];

pub const IGNORE_FILENAMES: &[&str] = &[
    // Property files
    "build.prop",
    "default.prop",
    // config.fs
    "fs_config_dirs",
    "fs_config_files",
    "group",
    // Licenses
    "NOTICE.xml.gz",
    "NOTICE_GPL.html.gz",
    "NOTICE_GPL.xml.gz",
    "passwd",
    // Recovery patch
    "recovery-from-boot.p",
    "ueventd.rc",
    // Partition symlinks
    "odm",
    "product",
    "system",
    "system_ext",
    "vendor",
];

const IGNORE_EXTENSIONS: &[&str] = &["odex", "vdex"];

const IGNORE_FOLDERS: &[&str] = &[
    "etc/hostapd",
    // Device init scripts
    "etc/init/hw",
    "etc/permissions",
    "etc/selinux",
    // Kernel modules
    "lib/modules",
    "lib/rfsa/adsp/tests",
    // RRO overlays
    "overlay",
    "rfs",
];

const IGNORE_PATHS: &[&str] = &[
    "etc/vintf/compatibility_matrix.xml",
    "etc/vintf/manifest.xml",
];

const SHELL_SCRIPT_PATTERN: &str = r"bin/.*\.sh";
const HAL_INTERFACE_LIB_PATTERN: &str = r"lib(64)?/(hw/)?android\..*\..*.so";
const HAL_IMPL_LIB_PATTERN: &str = r"lib(64)?/(hw/)?android\..*\..*-impl.so";
const VERSIONED_PROTOBUF_PATTERN: &str = r"lib(64)?/libprotobuf-cpp-(full|lite)-.*.so";

// No lookahead in `regex`: "X unless Y" is a pattern plus an exception.
#[derive(Debug, Clone)]
pub struct IgnorePattern {
    source: String,
    regex: Regex,
    exception: Option<Regex>,
}

impl IgnorePattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            source: pattern.to_string(),
            regex: anchored(pattern)?,
            exception: None,
        })
    }

    pub fn with_exception(mut self, exception: &str) -> Result<Self, regex::Error> {
        self.exception = Some(anchored(exception)?);
        Ok(self)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
            && !self
                .exception
                .as_ref()
                .is_some_and(|exception| exception.is_match(path))
    }
}

#[derive(Debug, Error)]
#[error("invalid ignore pattern '{pattern}'")]
pub struct PatternError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

fn anchored(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{pattern})"))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreEntries {
    pub binaries: Vec<String>,
    pub shared_libs: Vec<String>,
    pub filenames: Vec<String>,
    pub extensions: Vec<String>,
    pub folders: Vec<String>,
    pub paths: Vec<String>,
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct IgnoreCatalog {
    binaries: HashSet<String>,
    shared_libs: HashSet<String>,
    filenames: HashSet<String>,
    extensions: HashSet<String>,
    folders: HashSet<String>,
    paths: HashSet<String>,
    patterns: Vec<IgnorePattern>,
}

impl IgnoreCatalog {
    pub fn android_default() -> Self {
        Self {
            binaries: to_set(IGNORE_BINARIES),
            shared_libs: to_set(IGNORE_SHARED_LIBS),
            filenames: to_set(IGNORE_FILENAMES),
            extensions: to_set(IGNORE_EXTENSIONS),
            folders: to_set(IGNORE_FOLDERS),
            paths: to_set(IGNORE_PATHS),
            patterns: builtin_patterns(),
        }
    }

    pub fn extend(&mut self, entries: &IgnoreEntries) -> Result<(), PatternError> {
        let patterns = entries
            .patterns
            .iter()
            .map(|pattern| {
                IgnorePattern::new(pattern).map_err(|source| PatternError {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.binaries.extend(entries.binaries.iter().cloned());
        self.shared_libs.extend(entries.shared_libs.iter().cloned());
        self.filenames.extend(entries.filenames.iter().cloned());
        self.extensions.extend(
            entries
                .extensions
                .iter()
                .map(|extension| extension.trim_start_matches('.').to_string()),
        );
        self.folders.extend(
            entries
                .folders
                .iter()
                .map(|folder| folder.trim_matches('/').to_string()),
        );
        self.paths.extend(entries.paths.iter().cloned());
        self.patterns.extend(patterns);
        Ok(())
    }

    pub fn patterns(&self) -> &[IgnorePattern] {
        &self.patterns
    }

    pub fn is_blob_allowed(&self, blob: &Blob) -> bool {
        self.matching_rule(blob).is_none()
    }

    // binaries, shared libs, filenames, extension, ancestor folders, exact path, patterns
    pub fn matching_rule(&self, blob: &Blob) -> Option<IgnoreRule> {
        let name = blob.basename();
        if self.binaries.contains(name) {
            return Some(IgnoreRule::Binary);
        }
        if self.shared_libs.contains(name) {
            return Some(IgnoreRule::SharedLibrary);
        }
        if self.filenames.contains(name) {
            return Some(IgnoreRule::Filename);
        }
        if !blob.extension().is_empty() && self.extensions.contains(blob.extension()) {
            return Some(IgnoreRule::Extension);
        }
        if let Some(folder) = blob
            .ancestors()
            .iter()
            .find(|ancestor| self.folders.contains(ancestor.as_str()))
        {
            return Some(IgnoreRule::Folder(folder.clone()));
        }
        if self.paths.contains(blob.path()) {
            return Some(IgnoreRule::Path);
        }
        self.patterns
            .iter()
            .find(|pattern| pattern.matches(blob.path()))
            .map(|pattern| IgnoreRule::Pattern(pattern.as_str().to_string()))
    }
}

fn to_set(values: &[&str]) -> HashSet<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn builtin_patterns() -> Vec<IgnorePattern> {
    let shell_scripts =
        IgnorePattern::new(SHELL_SCRIPT_PATTERN).expect("shell script pattern compiles");
    // AOSP interface libs are shipped by the platform; only vendor `-impl` builds stay.
    let hal_interface_libs = IgnorePattern::new(HAL_INTERFACE_LIB_PATTERN)
        .and_then(|pattern| pattern.with_exception(HAL_IMPL_LIB_PATTERN))
        .expect("HAL interface pattern compiles");
    let versioned_protobuf =
        IgnorePattern::new(VERSIONED_PROTOBUF_PATTERN).expect("protobuf pattern compiles");
    vec![shell_scripts, hal_interface_libs, versioned_protobuf]
}
