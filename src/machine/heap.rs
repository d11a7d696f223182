use crate::value::ScriptValue;
use compact_str::CompactString;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef(u32);

impl ObjectRef {
    /// A stable identity for the lifetime of the heap.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub enum HeapObject {
    Array(Vec<ScriptValue>),
    Object(Vec<(CompactString, ScriptValue)>),
}

/// Arrays and objects live here and are shared by reference, so they may
/// contain themselves. The heap is dropped with the machine that owns it.
#[derive(Debug, Default)]
pub struct Heap {
    objects: Vec<HeapObject>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn allocate(&mut self, object: HeapObject) -> ObjectRef {
        self.objects.push(object);
        ObjectRef((self.objects.len() - 1) as u32)
    }

    pub fn allocate_array(&mut self, items: Vec<ScriptValue>) -> ScriptValue {
        ScriptValue::Array(self.allocate(HeapObject::Array(items)))
    }

    pub fn allocate_object(&mut self, entries: Vec<(CompactString, ScriptValue)>) -> ScriptValue {
        ScriptValue::Object(self.allocate(HeapObject::Object(entries)))
    }

    pub fn get(&self, handle: ObjectRef) -> Option<&HeapObject> {
        self.objects.get(handle.index())
    }

    pub fn array(&self, handle: ObjectRef) -> Option<&[ScriptValue]> {
        match self.get(handle)? {
            HeapObject::Array(items) => Some(items),
            HeapObject::Object(_) => None,
        }
    }

    pub fn array_mut(&mut self, handle: ObjectRef) -> Option<&mut Vec<ScriptValue>> {
        match self.objects.get_mut(handle.index())? {
            HeapObject::Array(items) => Some(items),
            HeapObject::Object(_) => None,
        }
    }

    pub fn entries(&self, handle: ObjectRef) -> Option<&[(CompactString, ScriptValue)]> {
        match self.get(handle)? {
            HeapObject::Object(entries) => Some(entries),
            HeapObject::Array(_) => None,
        }
    }

    pub fn get_property(&self, handle: ObjectRef, name: &str) -> Option<&ScriptValue> {
        self.entries(handle)?
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Overwrites an existing property in place, or appends a new one.
    pub fn set_property(&mut self, handle: ObjectRef, name: &str, value: ScriptValue) {
        let Some(HeapObject::Object(entries)) = self.objects.get_mut(handle.index()) else {
            return;
        };
        match entries.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => entries.push((name.into(), value)),
        }
    }
}
