//! 类与成员元数据
//!
//! 切点引擎只读取这些事实，不负责生成它们。元数据由外部的字节码/反射层提供，
//! 每个编译单元对应一份不可变快照。

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::BitOr;
use std::sync::Arc;

/// 访问修饰符集合
///
/// 位值与 JVM access flags 保持一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers(u16);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const PUBLIC: Modifiers = Modifiers(0x0001);
    pub const PRIVATE: Modifiers = Modifiers(0x0002);
    pub const PROTECTED: Modifiers = Modifiers(0x0004);
    pub const STATIC: Modifiers = Modifiers(0x0008);
    pub const FINAL: Modifiers = Modifiers(0x0010);
    pub const SYNCHRONIZED: Modifiers = Modifiers(0x0020);
    pub const VOLATILE: Modifiers = Modifiers(0x0040);
    pub const TRANSIENT: Modifiers = Modifiers(0x0080);
    pub const NATIVE: Modifiers = Modifiers(0x0100);
    pub const ABSTRACT: Modifiers = Modifiers(0x0400);

    const KEYWORDS: &'static [(&'static str, Modifiers)] = &[
        ("public", Modifiers::PUBLIC),
        ("private", Modifiers::PRIVATE),
        ("protected", Modifiers::PROTECTED),
        ("static", Modifiers::STATIC),
        ("final", Modifiers::FINAL),
        ("synchronized", Modifiers::SYNCHRONIZED),
        ("volatile", Modifiers::VOLATILE),
        ("transient", Modifiers::TRANSIENT),
        ("native", Modifiers::NATIVE),
        ("abstract", Modifiers::ABSTRACT),
    ];

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn from_bits(bits: u16) -> Self {
        Modifiers(bits)
    }

    pub const fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Modifiers) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// 解析单个修饰符关键字，例如 `public`
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::KEYWORDS
            .iter()
            .find(|(name, _)| *name == keyword)
            .map(|(_, modifier)| *modifier)
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Self) -> Self::Output {
        Modifiers(self.0 | rhs.0)
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Self::KEYWORDS
            .iter()
            .filter(|(_, modifier)| self.contains(*modifier))
            .map(|(name, _)| *name)
            .collect();
        write!(f, "{}", names.join(" "))
    }
}

/// 成员种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Method,
    Field,
    Constructor,
}

/// 成员元数据（方法、字段或构造器）
///
/// 值相等：cflow 帧的加入与移除依赖它
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberInfo {
    kind: MemberKind,
    name: String,
    modifiers: Modifiers,
    declaring_type: String,
    parameter_types: Vec<String>,
    return_type: Option<String>,
    field_type: Option<String>,
    exception_types: Vec<String>,
    attributes: BTreeSet<String>,
}

impl MemberInfo {
    fn new(kind: MemberKind, declaring_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            modifiers: Modifiers::NONE,
            declaring_type: declaring_type.into(),
            parameter_types: Vec::new(),
            return_type: None,
            field_type: None,
            exception_types: Vec::new(),
            attributes: BTreeSet::new(),
        }
    }

    /// 创建方法元数据，返回类型默认为 `void`
    pub fn method(declaring_type: impl Into<String>, name: impl Into<String>) -> Self {
        let mut member = Self::new(MemberKind::Method, declaring_type, name);
        member.return_type = Some("void".to_string());
        member
    }

    /// 创建构造器元数据，名称固定为 `new`
    pub fn constructor(declaring_type: impl Into<String>) -> Self {
        Self::new(MemberKind::Constructor, declaring_type, crate::pattern::CONSTRUCTOR_MARKER)
    }

    /// 创建字段元数据
    pub fn field(
        declaring_type: impl Into<String>,
        name: impl Into<String>,
        field_type: impl Into<String>,
    ) -> Self {
        let mut member = Self::new(MemberKind::Field, declaring_type, name);
        member.field_type = Some(field_type.into());
        member
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_parameters<I, S>(mut self, parameter_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameter_types = parameter_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_return_type(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = Some(return_type.into());
        self
    }

    pub fn with_exceptions<I, S>(mut self, exception_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exception_types = exception_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attributes.insert(attribute.into());
        self
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    pub fn parameter_types(&self) -> &[String] {
        &self.parameter_types
    }

    /// 方法的返回类型；字段和构造器为 `None`
    pub fn return_type(&self) -> Option<&str> {
        self.return_type.as_deref()
    }

    /// 字段类型；方法和构造器为 `None`
    pub fn field_type(&self) -> Option<&str> {
        self.field_type.as_deref()
    }

    pub fn exception_types(&self) -> &[String] {
        &self.exception_types
    }

    pub fn attributes(&self) -> &BTreeSet<String> {
        &self.attributes
    }

    pub fn has_attribute(&self, attribute: &str) -> bool {
        self.attributes.contains(attribute)
    }

    pub fn is_method(&self) -> bool {
        self.kind == MemberKind::Method
    }

    pub fn is_field(&self) -> bool {
        self.kind == MemberKind::Field
    }

    pub fn is_constructor(&self) -> bool {
        self.kind == MemberKind::Constructor
    }
}

impl fmt::Display for MemberInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MemberKind::Field => write!(
                f,
                "{} {}.{}",
                self.field_type.as_deref().unwrap_or("?"),
                self.declaring_type,
                self.name
            ),
            MemberKind::Method | MemberKind::Constructor => write!(
                f,
                "{}.{}({})",
                self.declaring_type,
                self.name,
                self.parameter_types.join(", ")
            ),
        }
    }
}

/// 类元数据
///
/// 类的身份就是它的全限定名：相等性与哈希只看名称
#[derive(Debug, Clone)]
pub struct ClassInfo {
    name: String,
    modifiers: Modifiers,
    is_interface: bool,
    interfaces: Vec<Arc<ClassInfo>>,
    superclass: Option<Arc<ClassInfo>>,
    methods: Vec<MemberInfo>,
    fields: Vec<MemberInfo>,
    constructors: Vec<MemberInfo>,
    attributes: BTreeSet<String>,
}

impl ClassInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modifiers: Modifiers::PUBLIC,
            is_interface: false,
            interfaces: Vec::new(),
            superclass: None,
            methods: Vec::new(),
            fields: Vec::new(),
            constructors: Vec::new(),
            attributes: BTreeSet::new(),
        }
    }

    pub fn interface(name: impl Into<String>) -> Self {
        let mut class = Self::new(name);
        class.is_interface = true;
        class.modifiers = Modifiers::PUBLIC | Modifiers::ABSTRACT;
        class
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_superclass(mut self, superclass: Arc<ClassInfo>) -> Self {
        self.superclass = Some(superclass);
        self
    }

    pub fn with_interface(mut self, interface: Arc<ClassInfo>) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn with_method(mut self, method: MemberInfo) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_field(mut self, field: MemberInfo) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_constructor(mut self, constructor: MemberInfo) -> Self {
        self.constructors.push(constructor);
        self
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attributes.insert(attribute.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 不含包名的简单类名
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn is_interface(&self) -> bool {
        self.is_interface
    }

    pub fn interfaces(&self) -> &[Arc<ClassInfo>] {
        &self.interfaces
    }

    /// 父类；层次结构的根为 `None`
    pub fn superclass(&self) -> Option<&Arc<ClassInfo>> {
        self.superclass.as_ref()
    }

    pub fn methods(&self) -> &[MemberInfo] {
        &self.methods
    }

    pub fn fields(&self) -> &[MemberInfo] {
        &self.fields
    }

    pub fn constructors(&self) -> &[MemberInfo] {
        &self.constructors
    }

    pub fn attributes(&self) -> &BTreeSet<String> {
        &self.attributes
    }

    pub fn has_attribute(&self, attribute: &str) -> bool {
        self.attributes.contains(attribute)
    }

    pub fn find_method(&self, name: &str) -> Option<&MemberInfo> {
        self.methods.iter().find(|m| m.name() == name)
    }

    pub fn find_field(&self, name: &str) -> Option<&MemberInfo> {
        self.fields.iter().find(|f| f.name() == name)
    }
}

impl PartialEq for ClassInfo {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ClassInfo {}

impl Hash for ClassInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// 取类型名最后一个 `.` 之后的部分
pub fn simple_name(type_name: &str) -> &str {
    type_name.rsplit('.').next().unwrap_or(type_name)
}
